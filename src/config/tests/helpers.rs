//! Layer composition shared by the configuration tests.

use ortho_config::MergeComposer;
use serde_json::Value;

use crate::BeaconConfig;

/// Source a layer of values comes from, lowest precedence first.
#[derive(Debug, Clone, Copy)]
pub enum Source {
    Defaults,
    File,
    Environment,
    Cli,
}

/// Merges `layers` in order into a [`BeaconConfig`].
pub fn compose(layers: &[(Source, Value)]) -> BeaconConfig {
    let mut composer = MergeComposer::new();
    for (source, values) in layers.iter().cloned() {
        match source {
            Source::Defaults => composer.push_defaults(values),
            Source::File => composer.push_file(values, None),
            Source::Environment => composer.push_environment(values),
            Source::Cli => composer.push_cli(values),
        }
    }
    BeaconConfig::merge_from_layers(composer.layers()).expect("layers should merge")
}
