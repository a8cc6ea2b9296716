pub mod core {
    pub mod collaborator;
    pub mod config;
    pub mod error;
    pub mod job;
    pub mod progress;
    pub mod runner;
    pub mod scheduler;
}


pub mod reporters;
