//! Prints the NetworkAddonsConfig CRD manifest to stdout.
//!
//! Usage: `cargo run --bin crdgen > deploy/crds/networkaddonsconfig.yaml`

use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    print!(
        "{}",
        serde_yaml::to_string(&crds::NetworkAddonsConfig::crd())?
    );
    Ok(())
}
