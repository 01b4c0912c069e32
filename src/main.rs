//! Inspect an xtc trajectory, quickly.
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use trajan::gro::read_gro;
use trajan::selection::Selection;
use trajan::topology::Topology;
use trajan::{each_frame, Error};

/// Summarize an xtc trajectory, optionally resolving atom selections
/// against a gro structure.
#[derive(Parser)]
struct Args {
    /// Input path (xtc).
    input: PathBuf,

    /// Structure path (gro). Required for name and residue selections.
    #[arg(short = 'c', long)]
    structure: Option<PathBuf>,

    /// Print the time value for each frame to standard output.
    #[arg(long)]
    times: bool,

    /// Print the step number for each frame to standard output.
    ///
    /// If both `times` and `steps` are active, they will be separated by
    /// tabs and printed in that order.
    #[arg(long)]
    steps: bool,

    /// Select atoms by atom name (e.g. `OW`). May be repeated.
    #[arg(short = 'n', long = "name")]
    names: Vec<String>,

    /// Select atoms by residue name (e.g. `SOL`). May be repeated.
    ///
    /// Name and residue selections are unioned into a single selection.
    #[arg(short = 'r', long = "resname")]
    resnames: Vec<String>,

    /// Print the positions of the selected atoms for each frame.
    #[arg(long)]
    dump: bool,

    /// Stop after this many frames.
    #[arg(short = 'f', long)]
    frames: Option<usize>,
}

fn main() -> trajan::Result<()> {
    simple_logger::init_with_level(log::Level::Warn)
        .expect("no other logger can have been set up before this one");
    let args = Args::parse();

    let selection = match resolve_selection(&args)? {
        Some(selection) => {
            eprintln!("selected {} atoms", selection.len());
            Some(selection)
        }
        None => None,
    };

    let mut stdout = std::io::stdout().lock();
    let mut stream = each_frame(&args.input)?;
    let mut nframes = 0;
    let mut natoms = 0;
    while let Some(frame) = stream.next_frame()? {
        if nframes == 0 {
            natoms = frame.natoms();
        }

        if args.times {
            write!(stdout, "{:.3}", frame.time)?;
        }
        if args.steps {
            if args.times {
                write!(stdout, "\t")?;
            }
            write!(stdout, "{}", frame.step)?;
        }
        if args.times || args.steps {
            writeln!(stdout)?;
        }

        if args.dump {
            let positions: Vec<_> = frame.coords().collect();
            match &selection {
                Some(selection) => {
                    for index in selection.iter() {
                        if let Some(position) = positions.get(index as usize) {
                            writeln!(stdout, "{} {} {} {}", index, position.x, position.y, position.z)?;
                        }
                    }
                }
                None => {
                    for (index, position) in positions.iter().enumerate() {
                        writeln!(stdout, "{} {} {} {}", index, position.x, position.y, position.z)?;
                    }
                }
            }
        }

        nframes += 1;
        if args.frames.is_some_and(|limit| nframes >= limit) {
            break;
        }
    }

    eprintln!("{}: {nframes} frames of {natoms} atoms", args.input.display());
    Ok(())
}

/// Union all name and residue-name queries into one selection, or `None`
/// when no query was given.
fn resolve_selection(args: &Args) -> trajan::Result<Option<Selection>> {
    if args.names.is_empty() && args.resnames.is_empty() {
        return Ok(None);
    }
    let Some(structure) = &args.structure else {
        return Err(Error::Gro(
            "a structure file is required to resolve selections (pass --structure)".to_string(),
        ));
    };
    let topology = Topology::new(&read_gro(structure)?);

    let mut selection = Selection::default();
    for name in &args.names {
        selection = selection.union(&Selection::from(topology.by_name(name)));
    }
    for resname in &args.resnames {
        selection = selection.union(&Selection::from(topology.by_resname(resname)));
    }
    Ok(Some(selection))
}
