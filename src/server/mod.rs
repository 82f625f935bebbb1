// Server module entry point
// Listener creation, per-connection tasks and the accept loop

pub mod connection;
pub mod listener;
pub mod server_loop;

pub use listener::create_listener;
pub use server_loop::start_server_loop;
