//! Index construction pipeline.
//!
//! Drives the four stages in order over one price panel:
//! prices → signals → weights → positions → gross returns.
//! The weight stage is delegated to the injected [`WeightAllocator`];
//! everything else is shared by both index variants.

use crate::domain::config::IndexConfig;
use crate::domain::error::IndexError;
use crate::domain::frame::Frame;
use crate::domain::panel::{CLOSE, PricePanel, VOLUME};
use crate::domain::positions::weights_to_positions;
use crate::domain::returns::positions_to_gross_returns;
use crate::domain::signal::SignalGenerator;
use crate::domain::weights::{WeightAllocator, allocator_for};
use tracing::{debug, info};

/// Every intermediate matrix of one run, all on the panel's axes.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub signals: Frame,
    pub weights: Frame,
    pub positions: Frame,
    pub gross_returns: Frame,
}

pub struct IndexPipeline {
    config: IndexConfig,
    signal_generator: SignalGenerator,
    allocator: Box<dyn WeightAllocator>,
}

impl IndexPipeline {
    /// Uses the allocator named by `config.weighting`.
    pub fn new(config: IndexConfig) -> Self {
        let allocator = allocator_for(&config);
        Self::with_allocator(config, allocator)
    }

    pub fn with_allocator(config: IndexConfig, allocator: Box<dyn WeightAllocator>) -> Self {
        let signal_generator = SignalGenerator::from_config(&config);
        Self {
            config,
            signal_generator,
            allocator,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn allocator_name(&self) -> &'static str {
        self.allocator.name()
    }

    pub fn prices_to_signals(&self, panel: &PricePanel) -> Result<Frame, IndexError> {
        self.signal_generator.generate(panel)
    }

    pub fn signals_to_weights(
        &self,
        signals: &Frame,
        panel: &PricePanel,
    ) -> Result<Frame, IndexError> {
        self.allocator.allocate(signals, panel)
    }

    pub fn weights_to_positions(&self, weights: &Frame) -> Frame {
        weights_to_positions(weights)
    }

    pub fn positions_to_gross_returns(
        &self,
        positions: &Frame,
        panel: &PricePanel,
    ) -> Result<Frame, IndexError> {
        positions_to_gross_returns(positions, panel)
    }

    fn validate(&self, panel: &PricePanel) -> Result<(), IndexError> {
        panel.require(&[CLOSE.to_string(), VOLUME.to_string()])?;
        panel.require(&self.config.fields)
    }

    pub fn run(&self, panel: &PricePanel) -> Result<PipelineOutput, IndexError> {
        self.validate(panel)?;
        info!(
            code = %self.config.code,
            weighting = self.allocator.name(),
            dates = panel.dates().len(),
            instruments = panel.instruments().len(),
            "running index pipeline"
        );

        let signals = self.prices_to_signals(panel)?;
        let weights = self.signals_to_weights(&signals, panel)?;
        let positions = self.weights_to_positions(&weights);
        let gross_returns = self.positions_to_gross_returns(&positions, panel)?;
        debug!(code = %self.config.code, "pipeline complete");

        Ok(PipelineOutput {
            signals,
            weights,
            positions,
            gross_returns,
        })
    }
}
