fn main() {
    // ESP-IDF environment propagation is only needed for firmware builds.
    // Host builds (tests, fuzzing) skip it entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
