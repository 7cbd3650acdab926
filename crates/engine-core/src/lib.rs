pub mod connectors {
    pub mod sink;
}
pub mod error;
pub mod state;
pub mod version;
