//! Build script that tracks the embedded Diesel migrations.
//!
//! `embed_migrations!` reads the `migrations/` directory at compile time, so
//! Cargo is told to rebuild whenever anything under it changes.

fn main() {
    println!("cargo:rerun-if-changed=migrations");
}
