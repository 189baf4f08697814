fn main() {
    // Migrations are embedded by `sqlx::migrate!()`, so edits to them must
    // trigger a rebuild even though no Rust file changed.
    println!("cargo:rerun-if-changed=migrations");
}
