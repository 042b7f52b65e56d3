//! Provides the frame store adapter for on-disk trajectory segments.
//!
//! A trajectory segment is a seekable, append-only container of frames that
//! may be growing while it is read. This module defines the read/write
//! contract ([`traits`]), its error taxonomy ([`error`]), and the GROMACS TRR
//! implementation ([`trr`]) built on the XDR primitives in [`xdr`].

pub mod error;
pub mod traits;
pub mod trr;
pub mod xdr;
