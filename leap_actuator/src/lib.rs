//! # leap_actuator
//!
//! Hand tracking in, serial commands out. Wires a [`motion_core`] pipeline
//! to a sample source and a serial port, and owns the lifecycle of both.
//!
//! ## Modes
//!
//! | Mode | Actuator | Hand input used |
//! |---|---|---|
//! | `pointer` | phone HID mouse emulator | palm velocity → deltas, grab → hold, tap → click |
//! | `arm` | four-servo desk arm | palm position → servo angles, grab → claw |
//!
//! ## Sources
//!
//! * `sim` (default): **Simulation window**, the mouse stands in for the palm.
//! * `replay`: a recorded CSV pose trace, see [`replay`].
//! * `leap`: **Hardware**, polls a real LeapMotion controller via LeapC.
//!   Needs the `leap` feature.
//!
//! ### Simulation controls
//!
//! | Input | Hand |
//! |---|---|
//! | Mouse over the volume | Palm x/y; leaving it means no hand |
//! | Left button held | Grab strength 1.0 |
//! | `W` / `S` held | Palm z away / toward |
//! | `Space` | Tap |
//! | `Q` / `Escape` | Quit |

pub mod source;
pub mod replay;
pub mod serial;
pub mod config;
pub mod session;
pub mod visualizer;
pub mod app;
