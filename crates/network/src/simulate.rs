//! Fixed-step simulation of a [`Network`].
//!
//! Each step samples the acceleration field at the current time, ticks the
//! network once and hands the resulting [`Event`] to an observer, which may
//! stop the run early.
//!
//! # Example
//!
//! ```ignore
//! use bulkflow_network::simulate;
//!
//! let solution = simulate::run_unobserved(&mut network, Vector3::new(0.0, 0.0, -9.81), dt, 500)?;
//!
//! for event in &solution.history {
//!     println!("t={:?}: {:?}", event.time, event.report.masses);
//! }
//! ```

mod action;
mod error;
mod event;
mod solution;

pub use action::Action;
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status};

use bulkflow_core::{Observer, constraint::StrictlyPositive};
use nalgebra::Vector3;
use uom::{
    ConstZero,
    si::{f64::Time, time::second},
};

use crate::{FluidContainer, Network};

/// The scene-space acceleration acting on a network over time.
///
/// Implemented for a constant `Vector3<f64>` and for any
/// `FnMut(Time) -> Vector3<f64>` closure.
pub trait AccelerationField {
    /// Returns the acceleration, in m/s², at simulated `time`.
    fn at(&mut self, time: Time) -> Vector3<f64>;
}

impl AccelerationField for Vector3<f64> {
    fn at(&mut self, _time: Time) -> Vector3<f64> {
        *self
    }
}

impl<F> AccelerationField for F
where
    F: FnMut(Time) -> Vector3<f64>,
{
    fn at(&mut self, time: Time) -> Vector3<f64> {
        self(time)
    }
}

/// Ticks `network` for `steps` fixed steps of `dt`.
///
/// # Observer
///
/// The observer receives an [`Event`] after every tick and may return
/// [`Action::StopEarly`] to end the run.
///
/// # Errors
///
/// Returns an error if `dt` is not strictly positive or if any tick fails.
/// Ticks completed before a failure stay applied to the network.
pub fn run<C, A, Obs>(
    network: &mut Network<C>,
    mut acceleration: A,
    dt: Time,
    steps: usize,
    mut observer: Obs,
) -> Result<Solution, Error>
where
    C: FluidContainer,
    A: AccelerationField,
    Obs: Observer<Event, Action>,
{
    let dt = StrictlyPositive::new(dt).map_err(Error::TimeStep)?.into_inner();

    let mut history = Vec::with_capacity(steps);
    let mut time = Time::ZERO;

    for step in 1..=steps {
        let report = network
            .tick(&acceleration.at(time), dt)
            .map_err(|source| Error::Tick { step, source })?;
        time += dt;

        let event = Event { step, time, report };
        let action = observer.observe(&event);
        history.push(event);

        if let Some(Action::StopEarly) = action {
            log::info!(
                "run stopped by observer after {step} steps at t = {:.3} s",
                time.get::<second>()
            );
            return Ok(Solution {
                status: Status::StoppedByObserver,
                steps: step,
                time,
                history,
            });
        }
    }

    log::info!(
        "run completed {steps} steps at t = {:.3} s",
        time.get::<second>()
    );
    Ok(Solution {
        status: Status::Complete,
        steps,
        time,
        history,
    })
}

/// Ticks `network` without observation.
///
/// This is a convenience wrapper around [`run`] that discards events as they arrive.
///
/// # Errors
///
/// Returns an error if `dt` is not strictly positive or if any tick fails.
pub fn run_unobserved<C, A>(
    network: &mut Network<C>,
    acceleration: A,
    dt: Time,
    steps: usize,
) -> Result<Solution, Error>
where
    C: FluidContainer,
    A: AccelerationField,
{
    run(network, acceleration, dt, steps, ())
}
