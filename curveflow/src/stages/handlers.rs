//! The fixed stage → handler table.

use std::fmt;
use std::sync::Arc;

use super::{simulated, PassThroughHandler, StageHandler};
use crate::core::StageKind;

/// One handler per stage kind.
///
/// Every kind has a handler by construction, so dispatch is an exhaustive
/// match rather than a lookup that can miss.
#[derive(Clone)]
pub struct StageHandlers {
    load: Arc<dyn StageHandler>,
    optimize: Arc<dyn StageHandler>,
    offset: Arc<dyn StageHandler>,
    validate: Arc<dyn StageHandler>,
    export: Arc<dyn StageHandler>,
}

impl StageHandlers {
    /// Creates a table from five handlers.
    #[must_use]
    pub fn new(
        load: Arc<dyn StageHandler>,
        optimize: Arc<dyn StageHandler>,
        offset: Arc<dyn StageHandler>,
        validate: Arc<dyn StageHandler>,
        export: Arc<dyn StageHandler>,
    ) -> Self {
        Self {
            load,
            optimize,
            offset,
            validate,
            export,
        }
    }

    /// Every stage succeeds and echoes its parameters.
    #[must_use]
    pub fn pass_through() -> Self {
        let handler: Arc<dyn StageHandler> = Arc::new(PassThroughHandler);
        Self::new(
            handler.clone(),
            handler.clone(),
            handler.clone(),
            handler.clone(),
            handler,
        )
    }

    /// Stand-in handlers for running without the external plugins.
    #[must_use]
    pub fn simulated() -> Self {
        Self::new(
            Arc::new(simulated::LoadHandler),
            Arc::new(simulated::OptimizeHandler),
            Arc::new(simulated::OffsetHandler),
            Arc::new(simulated::ValidateHandler),
            Arc::new(simulated::ExportHandler),
        )
    }

    /// Replaces the handler for one stage.
    #[must_use]
    pub fn with(mut self, kind: StageKind, handler: Arc<dyn StageHandler>) -> Self {
        *self.slot_mut(kind) = handler;
        self
    }

    /// Returns the handler for a stage.
    #[must_use]
    pub fn get(&self, kind: StageKind) -> &Arc<dyn StageHandler> {
        match kind {
            StageKind::Load => &self.load,
            StageKind::Optimize => &self.optimize,
            StageKind::Offset => &self.offset,
            StageKind::Validate => &self.validate,
            StageKind::Export => &self.export,
        }
    }

    fn slot_mut(&mut self, kind: StageKind) -> &mut Arc<dyn StageHandler> {
        match kind {
            StageKind::Load => &mut self.load,
            StageKind::Optimize => &mut self.optimize,
            StageKind::Offset => &mut self.offset,
            StageKind::Validate => &mut self.validate,
            StageKind::Export => &mut self.export,
        }
    }
}

impl Default for StageHandlers {
    fn default() -> Self {
        Self::pass_through()
    }
}

impl fmt::Debug for StageHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageHandlers")
            .field("stages", &StageKind::ALL)
            .finish_non_exhaustive()
    }
}
