//! Cache bootstrap state

/// Progress of loading persisted content into a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapState {
    /// Load still in flight
    Pending,
    /// Finished; number of entries loaded
    Loaded(usize),
    /// Load failed with this message
    Failed(String),
}

impl BootstrapState {
    /// Whether bootstrap has finished, successfully or not
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}
