//! Sequential and parallel proof verification.

use crate::{Error, Opt, Stage};
use mmko::{Builder, Check, Database, Includer};
use rayon::iter::{ParallelBridge, ParallelIterator};

fn verify(check: Check) -> Result<(), Error> {
    Ok(check.run()?)
}

/// Verify proofs as soon as they are read.
fn seq(tokens: Includer, builder: &mut Builder, opt: &Opt) -> Result<(), Error> {
    let verifying = !opt.omits(Stage::Verify);
    builder.read(tokens, |check| if verifying { verify(check) } else { Ok(()) })
}

/// Verify proofs on a separate thread while reading continues.
fn chan(
    tokens: Includer,
    builder: &mut Builder,
    capacity: Option<usize>,
    opt: &Opt,
) -> Result<(), Error> {
    let (sender, receiver) = match capacity {
        Some(capacity) => flume::bounded(capacity),
        None => flume::unbounded(),
    };

    let parallel = opt.jobs.is_some();
    let consumer = std::thread::spawn(move || {
        if parallel {
            receiver.into_iter().par_bridge().try_for_each(verify)
        } else {
            receiver.into_iter().try_for_each(verify)
        }
    });

    let verifying = !opt.omits(Stage::Verify);
    let read = builder.read(tokens, |check| {
        if verifying {
            sender.send(check).map_err(|_| Error::Disconnected)
        } else {
            Ok(())
        }
    });

    // signalise that we are done sending proofs
    // (otherwise the consumer will eventually wait forever)
    drop(sender);

    // sending fails prematurely if verification fails,
    // so report the verification error first
    consumer.join().map_err(|_| Error::Thread)??;
    read
}

/// Read a database and verify its proofs.
pub fn run(opt: &Opt) -> Result<Database, Error> {
    // if a precise number of parallel jobs has been given
    if let Some(Some(jobs)) = opt.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()?;
    }

    let tokens = Includer::open(&opt.file).map_err(mmko::Error::from)?;
    let mut builder = Builder::new(opt.config());

    // if parallel execution is enabled, assume an unbounded channel by default
    let channel = if opt.jobs.is_some() {
        Some(opt.channel_capacity.unwrap_or(None))
    } else {
        opt.channel_capacity
    };

    match channel {
        Some(capacity) => chan(tokens, &mut builder, capacity, opt)?,
        None => seq(tokens, &mut builder, opt)?,
    }

    if builder.is_stopped() {
        info!("stopped at label {:?}", opt.stop_label);
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn run_args(args: &[&str]) -> Result<Database, Error> {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let demo = dir.join("..").join("demos").join("demo0.mm");
        let mut argv = vec!["mmcheck".into(), demo.into_os_string()];
        argv.extend(args.iter().map(|arg| arg.into()));
        run(&Opt::parse_from(argv))
    }

    #[test]
    fn modes() {
        let modes: Vec<Vec<&str>> = vec![
            vec![],
            vec!["-c"],
            vec!["-c", "1"],
            vec!["-j"],
            vec!["-j", "--omit", "verify"],
            vec!["--omit", "verify"],
        ];
        for args in modes {
            let db = run_args(&args).unwrap();
            assert!(db.labels().contains("th1"));
        }
    }

    #[test]
    fn stop() {
        let db = run_args(&["-s", "th1"]).unwrap();
        assert!(!db.labels().contains("th1"));
        assert!(db.labels().contains("mp"));
    }

    #[test]
    fn missing() {
        let opt = Opt::parse_from(["mmcheck", "does/not/exist.mm"]);
        assert!(matches!(run(&opt), Err(Error::Mm(mmko::Error::Include(_)))));
    }
}
