#![allow(dead_code)]

use extmd::core::io::traits::TrajectoryFormat;
use extmd::core::io::trr::TrrFormat;
use extmd::core::models::frame::Frame;
use extmd::engine::config::{EngineConfig, EngineConfigBuilder};
use nalgebra::{Matrix3, Point3, Vector3};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

pub fn config(base: &Path) -> EngineConfig {
    EngineConfigBuilder::new()
        .name("gmx")
        .gro("conf.gro")
        .mdp("md.mdp")
        .top("topol.top")
        .base_dir(base)
        .build()
        .unwrap()
}

/// A three-atom frame whose coordinates encode `tag`.
pub fn frame(tag: usize) -> Frame {
    let t = tag as f32;
    Frame::new(
        vec![
            Point3::new(t, 0.5, -1.25),
            Point3::new(0.1, t * 2.0, 3.0),
            Point3::new(-0.3, 0.0, t + 0.75),
        ],
        vec![Vector3::new(0.01 * t, 0.2, -0.3); 3],
        Matrix3::new(3.0, 0.0, 0.0, 0.0, 3.5, 0.0, 0.0, 0.0, 4.0),
    )
}

/// Encoded bytes of a single TRR frame.
pub fn frame_bytes(frame: &Frame) -> Vec<u8> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("frame.trr");
    TrrFormat.write_frame(&path, frame).unwrap();
    fs::read(path).unwrap()
}

/// Bytes of a trajectory holding `frames` as frames `0..n`.
pub fn trajectory_bytes(frames: &[Frame]) -> Vec<u8> {
    frames.iter().flat_map(frame_bytes).collect()
}

pub fn write_trajectory(path: &Path, frames: &[Frame]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, trajectory_bytes(frames)).unwrap();
}

pub fn append_bytes(path: &Path, bytes: &[u8]) {
    use std::io::Write;
    let mut file = fs::OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
}
