fn main() {
    // ESP-IDF environment (linker args, sdkconfig) is only needed for
    // device builds; host builds run the pure-logic tests.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
