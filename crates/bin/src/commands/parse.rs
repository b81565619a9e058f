//! Path parse command - shows how a path string is split into segments.

use treewatch::watch::{Segment, parse_path};

use crate::cli::ParseArgs;
use crate::output::{OutputFormat, print_table};

/// Run the parse command
pub fn run(args: &ParseArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let path = parse_path(&args.path)?;

    match format {
        OutputFormat::Human => {
            if path.is_empty() {
                println!("Empty path.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = path
                .segments()
                .iter()
                .enumerate()
                .map(|(i, segment)| vec![i.to_string(), kind(segment).to_string(), segment.to_string()])
                .collect();
            print_table(&["#", "KIND", "SEGMENT"], &rows);
        }
        OutputFormat::Json => {
            let segments: Vec<_> = path.segments().iter().map(segment_json).collect();
            let value = serde_json::json!({
                "path": path.to_string(),
                "segments": segments,
                "pattern": path.has_wildcards(),
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }

    Ok(())
}

fn kind(segment: &Segment) -> &'static str {
    match segment {
        Segment::Key(_) => "key",
        Segment::Index(_) => "index",
        Segment::Wildcard => "wildcard",
    }
}

fn segment_json(segment: &Segment) -> serde_json::Value {
    match segment {
        Segment::Key(key) => serde_json::json!({ "key": key }),
        Segment::Index(index) => serde_json::json!({ "index": index }),
        Segment::Wildcard => serde_json::json!("*"),
    }
}
