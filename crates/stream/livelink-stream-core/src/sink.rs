use crate::error::SinkError;

/// Receives one payload per tick for a named subject.
///
/// Implemented for [`Session`](crate::Session) and for any
/// `FnMut(&str, f64, &T) -> Result<(), SinkError>` closure.
pub trait FrameSink<T: ?Sized> {
    fn deliver(&mut self, subject: &str, world_time: f64, payload: &T) -> Result<(), SinkError>;
}

impl<T: ?Sized, F> FrameSink<T> for F
where
    F: FnMut(&str, f64, &T) -> Result<(), SinkError>,
{
    fn deliver(&mut self, subject: &str, world_time: f64, payload: &T) -> Result<(), SinkError> {
        self(subject, world_time, payload)
    }
}
