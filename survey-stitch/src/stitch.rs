//! Stitching: join every client's current result file against the export
//!
//! For each manifest entry the result document is parsed, split into
//! positional answers and reserved values, and turned into an ordered list of
//! `{question, answer}` rows: one per exported field, then the raw client
//! identity and a composite mode summary. Clients are ordered by identifier so
//! the report does not depend on manifest insertion order.

use crate::error::{Result, StitchError};
use crate::publish::{self, OutputPaths};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use survey_common::result::{CLIENT_KEY, MODE_KEY};
use survey_common::{AnswerSet, Exports, ManifestIndex, ResultData};
use tracing::{debug, info};

/// Rendered answer for a field without any non-blank value
pub const NO_RESPONSE: &str = "[no response]";

/// How exported fields are labelled in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelStyle {
    /// `"03. Favorite color (option)"`
    #[default]
    Typed,
    /// `"03. Favorite color"`
    Plain,
}

/// One question/answer row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub question: String,
    pub answer: String,
}

/// One client's stitched record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StitchObject {
    pub file: String,
    #[serde(skip)]
    pub client: String,
    #[serde(skip)]
    pub mode: String,
    pub responses: Vec<Response>,
}

impl StitchObject {
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.responses.iter().map(|r| r.question.as_str())
    }
}

/// All records of one run, as serialized into the JSON report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StitchResult {
    #[serde(rename = "results")]
    pub objects: Vec<StitchObject>,
}

/// Stitched records plus the canonical column header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub header: Vec<String>,
    pub result: StitchResult,
}

/// Aggregation inputs
#[derive(Debug, Clone)]
pub struct Inputs {
    /// Manifest file
    pub manifest: PathBuf,
    /// Field schema export
    pub config: PathBuf,
    /// Folder of `<file>.json` result documents
    pub directory: PathBuf,
    /// Output prefix; `.json`, `.csv`, `.html` and `.tar.gz` are appended
    pub out_name: PathBuf,
    pub labels: LabelStyle,
}

impl Inputs {
    /// Run the aggregation and publish all four report files
    pub fn process(&self) -> Result<OutputPaths> {
        for path in [&self.manifest, &self.config, &self.directory] {
            if !path.exists() {
                return Err(StitchError::MissingInput(path.clone()));
            }
        }
        let outputs = OutputPaths::from_prefix(&self.out_name)?;

        let manifest = ManifestIndex::load(&self.manifest)?;
        let exports = Exports::load(&self.config)?;
        info!(
            manifest = %self.manifest.display(),
            clients = manifest.len(),
            fields = exports.len(),
            "stitching results"
        );

        let report = stitch(&manifest, &exports, &self.directory, self.labels)?;
        publish::save(&report, &outputs)?;
        info!(out = %self.out_name.display(), "results written");
        Ok(outputs)
    }
}

/// Build every client record for a manifest
pub fn stitch(
    manifest: &ManifestIndex,
    exports: &Exports,
    directory: &Path,
    labels: LabelStyle,
) -> Result<Report> {
    manifest.check()?;
    if manifest.is_empty() {
        return Err(StitchError::NoObjects);
    }

    let mut seen = HashSet::new();
    let mut objects = Vec::with_capacity(manifest.len());
    for entry in manifest.entries() {
        if !seen.insert(entry.client.clone()) {
            return Err(StitchError::DuplicateClient(entry.client));
        }
        let path = directory.join(format!("{}.json", entry.file));
        if !path.exists() {
            return Err(StitchError::MissingResult(path));
        }
        let data = ResultData::load(&path)?;
        let object = build_object(&entry.file, &entry.client, &entry.mode, &data, exports, labels)?;
        debug!(client = %object.client, file = %object.file, "stitched");
        objects.push(object);
    }
    objects.sort_by(|a, b| a.client.cmp(&b.client));

    Ok(Report {
        header: report_header(exports, labels),
        result: StitchResult { objects },
    })
}

/// Join one result document against the export
pub fn build_object(
    file: &str,
    client: &str,
    mode: &str,
    data: &ResultData,
    exports: &Exports,
    labels: LabelStyle,
) -> Result<StitchObject> {
    let answers = AnswerSet::parse(data, exports.len())?;
    if !exports.is_empty() && answers.answered() == 0 {
        return Err(StitchError::NoFields {
            file: file.to_string(),
        });
    }

    let summary = mode_summary(mode, answers.session(), answers.timestamp());

    let mut fields: Vec<(String, &[String])> = exports
        .fields
        .iter()
        .enumerate()
        .map(|(index, _)| {
            (
                field_label(exports, index, labels),
                answers.answer(index).unwrap_or(&[]),
            )
        })
        .collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let mut responses: Vec<Response> = fields
        .into_iter()
        .map(|(question, values)| Response {
            question,
            answer: render_answer(values),
        })
        .collect();
    responses.push(Response {
        question: CLIENT_KEY.to_string(),
        answer: render_answer(&[client.to_string()]),
    });
    responses.push(Response {
        question: MODE_KEY.to_string(),
        answer: render_answer(&[summary.clone()]),
    });

    Ok(StitchObject {
        file: file.to_string(),
        client: client.to_string(),
        mode: summary,
        responses,
    })
}

/// Label of export position `index`, zero padded so labels sort by position
pub fn field_label(exports: &Exports, index: usize, labels: LabelStyle) -> String {
    let width = index_width(exports.len());
    let field = &exports.fields[index];
    match labels {
        LabelStyle::Typed => format!(
            "{:0width$}. {} ({})",
            index,
            field.text,
            field.field_type,
            width = width
        ),
        LabelStyle::Plain => format!("{:0width$}. {}", index, field.text, width = width),
    }
}

/// Canonical column order, derived from the export alone
pub fn report_header(exports: &Exports, labels: LabelStyle) -> Vec<String> {
    let mut header: Vec<String> = (0..exports.len())
        .map(|index| field_label(exports, index, labels))
        .collect();
    header.sort();
    header.push(CLIENT_KEY.to_string());
    header.push(MODE_KEY.to_string());
    header
}

/// `mode:<m> - session:<s> - timestamp:<t>`, components sorted
pub fn mode_summary(mode: &str, session: &[String], timestamp: &[String]) -> String {
    let mut parts = vec![
        format!("{}:{}", MODE_KEY, mode),
        format!("session:{}", session.join(",")),
        format!("timestamp:{}", timestamp.join(",")),
    ];
    parts.sort();
    parts.join(" - ")
}

/// Newline-joined non-blank values, or [`NO_RESPONSE`]
pub fn render_answer(values: &[String]) -> String {
    let kept: Vec<&str> = values
        .iter()
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .collect();
    if kept.is_empty() {
        NO_RESPONSE.to_string()
    } else {
        kept.join("\n")
    }
}

fn index_width(count: usize) -> usize {
    let largest = count.saturating_sub(1);
    largest.to_string().len().max(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_common::{ExportField, QuestionKind};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn exports(n: usize) -> Exports {
        Exports::new(
            (0..n)
                .map(|i| ExportField::new(format!("Question {}", i), QuestionKind::Input))
                .collect(),
        )
    }

    fn data(pairs: &[(&str, &[&str])]) -> ResultData {
        ResultData::new(pairs.iter().map(|(k, v)| (k.to_string(), strings(v))).collect())
    }

    #[test]
    fn test_render_answer_drops_blanks() {
        assert_eq!(render_answer(&strings(&["a", "", "b"])), "a\nb");
        assert_eq!(render_answer(&strings(&["  ", "\t"])), NO_RESPONSE);
        assert_eq!(render_answer(&[]), NO_RESPONSE);
        assert_eq!(render_answer(&strings(&["only"])), "only");
    }

    #[test]
    fn test_mode_summary_is_sorted() {
        let summary = mode_summary("save", &strings(&["s1"]), &strings(&["t1"]));
        assert_eq!(summary, "mode:save - session:s1 - timestamp:t1");

        let summary = mode_summary("snapshot", &[], &[]);
        assert_eq!(summary, "mode:snapshot - session: - timestamp:");
    }

    #[test]
    fn test_field_label_styles() {
        let ex = Exports::new(vec![ExportField::new("Name", QuestionKind::Input)]);
        assert_eq!(field_label(&ex, 0, LabelStyle::Typed), "00. Name (input)");
        assert_eq!(field_label(&ex, 0, LabelStyle::Plain), "00. Name");
    }

    #[test]
    fn test_labels_sort_numerically_past_two_digits() {
        let ex = exports(120);
        let header = report_header(&ex, LabelStyle::Plain);
        assert_eq!(header[0], "000. Question 0");
        assert_eq!(header[9], "009. Question 9");
        assert_eq!(header[100], "100. Question 100");
        assert_eq!(header[119], "119. Question 119");
        assert_eq!(&header[120..], &["client".to_string(), "mode".to_string()]);
    }

    #[test]
    fn test_join_completeness() {
        let ex = exports(3);
        let raw = data(&[("0", &["a"]), ("1", &["b"]), ("2", &["c"]), ("session", &["s"])]);

        let object = build_object("f1", "c1", "save", &raw, &ex, LabelStyle::Typed).unwrap();

        assert_eq!(object.responses.len(), 5);
        let labels: Vec<&str> = object.labels().collect();
        assert_eq!(
            labels,
            vec![
                "00. Question 0 (input)",
                "01. Question 1 (input)",
                "02. Question 2 (input)",
                "client",
                "mode"
            ]
        );
        assert_eq!(object.responses[1].answer, "b");
        assert_eq!(object.responses[3].answer, "c1");
        assert_eq!(labels, report_header(&ex, LabelStyle::Typed));
    }

    #[test]
    fn test_partial_answers_render_no_response() {
        let ex = exports(2);
        let raw = data(&[("1", &["", "yes"])]);

        let object = build_object("f1", "c1", "snapshot", &raw, &ex, LabelStyle::Plain).unwrap();

        assert_eq!(object.responses[0].answer, NO_RESPONSE);
        assert_eq!(object.responses[1].answer, "yes");
    }

    #[test]
    fn test_no_joinable_fields_is_an_error() {
        let ex = exports(2);
        let raw = data(&[("session", &["s"]), ("timestamp", &["t"])]);

        let err = build_object("f1", "c1", "save", &raw, &ex, LabelStyle::Typed).unwrap_err();
        assert!(matches!(err, StitchError::NoFields { ref file } if file == "f1"));
    }

    #[test]
    fn test_empty_export_yields_identity_rows_only() {
        let raw = data(&[("session", &["s"])]);
        let object =
            build_object("f1", "c1", "save", &raw, &Exports::default(), LabelStyle::Typed).unwrap();
        let labels: Vec<&str> = object.labels().collect();
        assert_eq!(labels, vec!["client", "mode"]);
    }

    #[test]
    fn test_malformed_key_propagates() {
        let ex = exports(1);
        let raw = data(&[("0", &["a"]), ("bogus", &["b"])]);
        let err = build_object("f1", "c1", "save", &raw, &ex, LabelStyle::Typed).unwrap_err();
        assert!(matches!(err, StitchError::Common(_)));
    }

    #[test]
    fn test_stitch_orders_clients() {
        let dir = tempfile::tempdir().unwrap();
        for file in ["fz", "fa"] {
            std::fs::write(
                dir.path().join(format!("{}.json", file)),
                br#"{"data":{"0":["x"]}}"#,
            )
            .unwrap();
        }
        let manifest = ManifestIndex {
            files: strings(&["fz", "fa"]),
            clients: strings(&["zeta", "alpha"]),
            modes: strings(&["save", "snapshot"]),
        };

        let report = stitch(&manifest, &exports(1), dir.path(), LabelStyle::Typed).unwrap();

        let clients: Vec<&str> = report.result.objects.iter().map(|o| o.client.as_str()).collect();
        assert_eq!(clients, vec!["alpha", "zeta"]);
        assert_eq!(report.result.objects[0].file, "fa");
    }

    #[test]
    fn test_stitch_rejects_duplicate_client() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.json"), br#"{"data":{"0":["x"]}}"#).unwrap();
        let manifest = ManifestIndex {
            files: strings(&["f", "f"]),
            clients: strings(&["c", "c"]),
            modes: strings(&["save", "save"]),
        };
        let err = stitch(&manifest, &exports(1), dir.path(), LabelStyle::Typed).unwrap_err();
        assert!(matches!(err, StitchError::DuplicateClient(_)));
    }

    #[test]
    fn test_stitch_rejects_empty_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = stitch(&ManifestIndex::new(), &exports(1), dir.path(), LabelStyle::Typed)
            .unwrap_err();
        assert!(matches!(err, StitchError::NoObjects));
    }

    #[test]
    fn test_stitch_rejects_corrupt_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = ManifestIndex {
            files: strings(&["f"]),
            clients: vec![],
            modes: strings(&["save"]),
        };
        let err = stitch(&manifest, &exports(1), dir.path(), LabelStyle::Typed).unwrap_err();
        assert!(matches!(
            err,
            StitchError::Common(survey_common::Error::CorruptIndex { .. })
        ));
    }
}
