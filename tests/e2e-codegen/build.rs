use std::path::PathBuf;

use process_templates::{EngineKind, FileSetSpec, TemplateRenderer};

fn main() {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());

    let spec = FileSetSpec::new(manifest_dir.join("templates"), ["**/*.rs.vm"]);
    let renderer = TemplateRenderer::new(EngineKind::Velocity);

    // One rendering per API level on either side of the handle-width switch.
    for api_level in [19, 21] {
        renderer
            .run(&spec, api_level, &out_dir.join(format!("api{api_level}")))
            .expect("process-templates failed");
    }

    println!("cargo:rerun-if-changed=templates/");
    println!("cargo:rerun-if-changed=../../process-templates/src/");
}
