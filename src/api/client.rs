use crate::api::{
    error::{StatusError, TriggerError},
    status::GenerationStatus,
};

/// The remote side of a timetable generation job.
///
/// [`Server`](crate::backend::rest::Server) talks to the REST backend,
/// tests substitute scripted implementations.
#[rustfmt::skip]
pub trait Client {
    fn start_generation(&mut self) -> Result<(), TriggerError>;
    fn generation_status(&mut self) -> Result<GenerationStatus, StatusError>;
}

impl<C: Client + ?Sized> Client for Box<C> {
    fn start_generation(&mut self) -> Result<(), TriggerError> {
        (**self).start_generation()
    }

    fn generation_status(&mut self) -> Result<GenerationStatus, StatusError> {
        (**self).generation_status()
    }
}
