//! Link configuration for the native fastText binding.

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=FASTTEXT_LIB_DIR");

    // Only the `fasttext-ffi` feature links native code.
    if env::var("CARGO_FEATURE_FASTTEXT_FFI").is_err() {
        return;
    }

    if let Ok(dir) = env::var("FASTTEXT_LIB_DIR") {
        println!("cargo:rustc-link-search=native={dir}");
    }

    // libfasttext is C++ and pulls in libm.
    println!("cargo:rustc-link-lib=stdc++");
    println!("cargo:rustc-link-lib=m");
}
