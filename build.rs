fn main() {
    // ESP-IDF environment propagation is only needed for the device build;
    // host builds (tests, fuzzing) have nothing to generate.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
