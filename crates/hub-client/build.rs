use protoc_bin_vendored::protoc_bin_path;
use std::{env, error::Error};

const PROTOS: &[&str] = &[
    "proto/hub/v1/types.proto",
    "proto/hub/v1/hub.proto",
    "proto/hub/v1/management.proto",
];

fn main() -> Result<(), Box<dyn Error>> {
    let protoc = protoc_bin_path().expect("vendored protoc is not available for this host");
    unsafe {
        env::set_var("PROTOC", &protoc);
    }

    // Server traits are generated too; the integration tests serve fakes with them.
    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .compile_protos(PROTOS, &["proto"])?;

    for proto in PROTOS {
        println!("cargo:rerun-if-changed={proto}");
    }
    Ok(())
}
