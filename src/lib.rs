pub mod cli;
pub mod steam;
pub mod store;
pub mod sync;

pub mod util {
    pub mod env;
    pub mod log;
}
