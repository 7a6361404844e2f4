mod provider;

pub use provider::DefinitionProvider;
