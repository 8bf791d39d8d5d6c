pub mod audit;
pub mod dashboard;
pub mod lpj;
pub mod notification;
pub mod pengurus;
pub mod periode;
pub mod pondok;
pub mod rab;
pub mod user;
pub mod workflow;
