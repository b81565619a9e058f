//! Replay command - applies a mutation script and reports stream emissions.

use std::{cell::Cell, cell::RefCell, rc::Rc};

use tracing::info;
use treewatch::{
    crdt::{Doc, MapRef},
    observable::Subscription,
    watch::{parse_path, watch_path, watch_path_pattern},
};

use crate::cli::ReplayArgs;
use crate::output::{OutputFormat, print_json_lines, print_table};
use crate::script::{self, Op};

/// One stream emission, tagged with the script step that caused it.
/// Step 0 is the initial emission on subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub step: usize,
    pub stream: String,
    pub value: serde_json::Value,
}

impl Emission {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "step": self.step,
            "stream": self.stream,
            "value": self.value,
        })
    }
}

/// Run the replay command
pub fn run(args: &ReplayArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let ops = script::load(&args.script)?;
    let doc = Doc::new();
    let root = doc.get_or_insert_map(&args.root)?;

    let emissions = replay(&doc, &root, &ops, &args.watches, &args.patterns)?;
    info!(steps = ops.len(), emissions = emissions.len(), "replay finished");

    match format {
        OutputFormat::Human => {
            let rows: Vec<Vec<String>> = emissions
                .iter()
                .map(|e| vec![e.step.to_string(), e.stream.clone(), e.value.to_string()])
                .collect();
            print_table(&["STEP", "STREAM", "VALUE"], &rows);
            if args.dump {
                println!();
                println!("{}", serde_json::to_string_pretty(&root.snapshot()?)?);
            }
        }
        OutputFormat::Json => {
            let mut lines: Vec<_> = emissions.iter().map(Emission::to_json).collect();
            if args.dump {
                lines.push(serde_json::json!({ "document": root.snapshot()? }));
            }
            print_json_lines(&lines)?;
        }
    }

    Ok(())
}

/// Subscribes the requested streams, applies `ops` one by one, and returns
/// everything the streams emitted.
pub fn replay(
    doc: &Doc,
    root: &MapRef,
    ops: &[Op],
    watches: &[String],
    patterns: &[String],
) -> Result<Vec<Emission>, Box<dyn std::error::Error>> {
    let step = Rc::new(Cell::new(0));
    let emissions: Rc<RefCell<Vec<Emission>>> = Rc::default();
    let mut subscriptions = Vec::new();

    for path in watches {
        let stream = format!("watch {path}");
        let (step, sink) = (step.clone(), emissions.clone());
        subscriptions.push(watch_path(root.clone(), &parse_path(path)?).subscribe(move |value| {
            sink.borrow_mut().push(Emission {
                step: step.get(),
                stream: stream.clone(),
                value: value.and_then(|v| v.snapshot().ok()).unwrap_or_default(),
            });
        }));
    }
    for pattern in patterns {
        let stream = format!("pattern {pattern}");
        let (step, sink) = (step.clone(), emissions.clone());
        let observable = watch_path_pattern(Some(root.as_container()), &parse_path(pattern)?);
        subscriptions.push(observable.subscribe(move |container| {
            sink.borrow_mut().push(Emission {
                step: step.get(),
                stream: stream.clone(),
                value: container.and_then(|c| c.snapshot().ok()).unwrap_or_default(),
            });
        }));
    }

    for (i, op) in ops.iter().enumerate() {
        step.set(i + 1);
        script::apply_step(doc, root, op)?;
    }
    Subscription::merge(subscriptions).unsubscribe();

    let emissions = emissions.borrow().clone();
    Ok(emissions)
}
