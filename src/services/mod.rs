//! Service implementations
//!
//! Concrete backends for the ports in `traits`: the kubectl control-plane
//! client, the docker volume inventory, and the console prompt.

pub mod console;
pub mod docker;
pub mod kubectl;

pub use console::ConsolePrompt;
pub use docker::DockerStore;
pub use kubectl::KubectlClient;
