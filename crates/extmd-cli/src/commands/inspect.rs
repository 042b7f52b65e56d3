use crate::cli::InspectArgs;
use crate::error::Result;
use extmd::core::io::error::FrameStoreError;
use extmd::core::io::traits::FrameReader;
use extmd::core::io::trr::TrrReader;
use extmd::core::models::frame::Frame;
use tracing::info;

/// How a trajectory file ends after its last complete frame.
#[derive(Debug, PartialEq, Eq)]
enum Tail {
    Clean,
    /// A frame is still being written (or was cut short).
    Incomplete(String),
}

pub fn run(args: InspectArgs) -> Result<()> {
    info!("Inspecting trajectory {:?}", &args.path);
    let mut reader = TrrReader::open(&args.path)?;
    let (complete, tail) = survey(&mut reader)?;

    println!("{}: {} complete frame(s)", args.path.display(), complete);
    if let Tail::Incomplete(reason) = &tail {
        println!("  trailing frame {}: {}", complete, reason);
    }

    if let Some(index) = args.frame {
        let frame = reader.read_frame(index)?;
        print!("{}", describe(index, &frame));
    }
    Ok(())
}

fn survey(reader: &mut TrrReader) -> Result<(usize, Tail)> {
    let complete = reader.count_complete_frames()?;
    let tail = match reader.read_frame(complete) {
        Err(FrameStoreError::FrameNotFound { .. }) => Tail::Clean,
        Err(FrameStoreError::FrameCorrupt { kind, .. }) => Tail::Incomplete(kind.to_string()),
        Err(e) => return Err(e.into()),
        Ok(_) => Tail::Clean,
    };
    Ok((complete, tail))
}

fn describe(index: usize, frame: &Frame) -> String {
    let mut out = format!(
        "frame {}: {} atom(s), velocities: {}\n",
        index,
        frame.n_atoms(),
        if frame.has_velocities() { "yes" } else { "no" }
    );
    for i in 0..3 {
        let v = frame.box_vector(i);
        out.push_str(&format!("  box[{i}] = ({:.4}, {:.4}, {:.4})\n", v.x, v.y, v.z));
    }
    for (i, p) in frame.coordinates.iter().take(5).enumerate() {
        out.push_str(&format!("  x[{i}] = ({:.4}, {:.4}, {:.4})\n", p.x, p.y, p.z));
    }
    if frame.n_atoms() > 5 {
        out.push_str(&format!("  ... {} more atom(s)\n", frame.n_atoms() - 5));
    }
    out
}
