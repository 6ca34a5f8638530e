//! Sample random line runs out of a file.
//!
//! Each sink commits one uniformly random contiguous run of `run-length`
//! lines; the committed runs land as files `<stem>_<i>_<n>` in the current
//! directory.
//!
//! ```text
//! cargo run --example sample_file -- input.txt picked 2 15
//! ```

use renzoku::{sample_runs, DirFilerFactory, FilerSink, Sink, Slot};
use std::io::BufRead;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [source, stem, sinks, run_length] = args.as_slice() else {
        eprintln!("usage: sample_file <source> <dest-stem> <sink-count> <run-length>");
        std::process::exit(2);
    };
    let sinks: usize = sinks.parse()?;
    let run_length: usize = run_length.parse()?;

    let mut slots: Vec<_> = (0..sinks)
        .map(|i| {
            let factory = DirFilerFactory::new(".", format!("{stem}_{i}"));
            Slot::new(FilerSink::new(factory), run_length)
        })
        .collect();

    let file = std::fs::File::open(source)?;
    let lines = std::io::BufReader::new(file)
        .split(b'\n')
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|mut l| {
            l.push(b'\n');
            l
        });

    sample_runs(lines, &mut slots)?;

    for (i, slot) in slots.iter_mut().enumerate() {
        match slot.sink_mut().finalize()? {
            Some(name) => println!("sink {i}: {name}"),
            None => println!("sink {i}: no run committed (stream too short)"),
        }
    }
    Ok(())
}
