//! Answering of JSON requests, one per line.

use crate::Error;
use mmko::{Database, Request, Response, Server};
use std::io::{BufRead, Write};

/// Answer a single line of input.
fn answer(server: &mut Server, line: &str) -> Response {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => {
            debug!("request: {:?}", request);
            server.handle(request)
        }
        Err(e) => Response {
            error: Some(e.to_string()),
            ..Default::default()
        },
    }
}

/// Answer requests until the input ends.
pub fn serve(db: &Database, input: impl BufRead, mut output: impl Write) -> Result<(), Error> {
    let mut server = Server::new(db);
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        serde_json::to_writer(&mut output, &answer(&mut server, &line))?;
        writeln!(output)?;
        output.flush()?;
    }
    Ok(())
}

#[test]
fn requests() {
    use mmko::Config;
    let src = "$c wff |- ( ) -> $. $v ph $. wph $f wff ph $.
        ax-id $a |- ( ph -> ph ) $.";
    let db = Database::from_source(src, Config::default()).unwrap();

    let input = r#"{"cmd":"init_search","name":"ax-id","namespace":null}

{"cmd":"run_tac","search_id":0,"tactic_state_id":0,"tactic":"[[ ]] |- ( ph -> ph )"}
{"cmd":"clear_search","search_id":0}
nonsense
"#;
    let mut output = Vec::new();
    serve(&db, input.as_bytes(), &mut output).unwrap();
    let lines: Vec<Response> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0].search_id, Some(0));
    assert_eq!(lines[1].tactic_state.as_deref(), Some("no goals"));
    assert_eq!(lines[2], Response::default());
    assert!(lines[3].error.is_some());
}
