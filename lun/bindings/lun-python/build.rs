fn main() {
    // Extension modules resolve Python symbols when they're loaded, which
    // macOS linkers need to be told about.
    pyo3_build_config::add_extension_module_link_args();
}
