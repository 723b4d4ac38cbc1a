//! CSV import of project records.
//!
//! Recognized columns (header names are matched case-insensitively):
//!
//! | column | meaning |
//! |---|---|
//! | `proj_id` or `id` | project id, required |
//! | `cost`, `benefit` | required numbers |
//! | `region`, `exclusive_group` | optional tags |
//! | `requires` | `;`-separated prerequisite ids |
//! | `social_score` or `secondary_score` | optional second criterion |
//! | `priority` | read, never constrained |
//!
//! Any other column whose non-empty cells all parse as numbers is a resource
//! column, blanks counting as zero. Remaining text columns are ignored.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::{debug, info};

use crate::budgeting::{Project, ProjectDataset};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: project id is empty")]
    BlankId { row: usize },

    #[error("row {row}, field '{field}': '{value}' is not a number")]
    InvalidNumber {
        row: usize,
        field: String,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, ImportError>;

/// Reads projects from a CSV file.
pub fn load_projects(path: impl AsRef<Path>) -> Result<ProjectDataset> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let dataset = parse_projects(file)?;
    info!(path = %path.display(), projects = dataset.len(), "loaded project dataset");
    Ok(dataset)
}

/// Reads projects from any CSV source with a header row.
pub fn parse_projects<R: Read>(source: R) -> Result<ProjectDataset> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let columns = Columns::locate(&headers)?;

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let row = record.position().map_or(idx + 2, |p| p.line() as usize);
        rows.push((row, record));
    }

    let resources = columns.resource_columns(&headers, &rows);
    debug!(
        rows = rows.len(),
        resources = ?resources.iter().map(|&c| headers[c].as_str()).collect::<Vec<_>>(),
        "parsed project csv"
    );

    let mut projects = Vec::with_capacity(rows.len());
    for (row, record) in &rows {
        let row = *row;
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(str::trim).unwrap_or("");

        let id = cell(Some(columns.id));
        if id.is_empty() {
            return Err(ImportError::BlankId { row });
        }

        let cost = required_number(row, &headers[columns.cost], cell(Some(columns.cost)))?;
        let benefit =
            required_number(row, &headers[columns.benefit], cell(Some(columns.benefit)))?;
        let mut project = Project::new(id, cost, benefit);

        if let Some(score) = optional_number(row, "secondary_score", cell(columns.secondary))? {
            project = project.with_secondary_score(score);
        }
        if let Some(priority) = optional_number(row, "priority", cell(columns.priority))? {
            project = project.with_priority(priority);
        }

        let region = cell(columns.region);
        if !region.is_empty() {
            project = project.with_region(region);
        }
        let group = cell(columns.exclusive_group);
        if !group.is_empty() {
            project = project.with_exclusive_group(group);
        }
        for prerequisite in cell(columns.requires)
            .split(';')
            .map(str::trim)
            .filter(|r| !r.is_empty())
        {
            project = project.requiring(prerequisite);
        }

        for &c in &resources {
            let value = optional_number(row, &headers[c], cell(Some(c)))?.unwrap_or(0.0);
            project = project.with_resource(headers[c].clone(), value);
        }

        projects.push(project);
    }

    Ok(ProjectDataset::new(projects))
}

/// Positions of the recognized columns.
struct Columns {
    id: usize,
    cost: usize,
    benefit: usize,
    region: Option<usize>,
    exclusive_group: Option<usize>,
    requires: Option<usize>,
    secondary: Option<usize>,
    priority: Option<usize>,
}

impl Columns {
    fn locate(headers: &[String]) -> Result<Self> {
        let by_name: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .rev()
            .map(|(i, h)| (h.to_ascii_lowercase(), i))
            .collect();
        let find = |names: &[&str]| names.iter().find_map(|n| by_name.get(*n).copied());
        let require = |names: &[&str]| {
            find(names).ok_or_else(|| ImportError::MissingColumn(names[0].to_string()))
        };

        Ok(Self {
            id: require(&["proj_id", "id"])?,
            cost: require(&["cost"])?,
            benefit: require(&["benefit"])?,
            region: find(&["region"]),
            exclusive_group: find(&["exclusive_group"]),
            requires: find(&["requires"]),
            secondary: find(&["social_score", "secondary_score"]),
            priority: find(&["priority"]),
        })
    }

    fn is_known(&self, idx: usize, header: &str) -> bool {
        let claimed = [
            Some(self.id),
            Some(self.cost),
            Some(self.benefit),
            self.region,
            self.exclusive_group,
            self.requires,
            self.secondary,
            self.priority,
        ];
        claimed.contains(&Some(idx))
            || matches!(
                header.to_ascii_lowercase().as_str(),
                "proj_id"
                    | "id"
                    | "region"
                    | "exclusive_group"
                    | "requires"
                    | "social_score"
                    | "secondary_score"
                    | "priority"
            )
    }

    /// Unclaimed columns holding at least one number and nothing but numbers.
    fn resource_columns(&self, headers: &[String], rows: &[(usize, StringRecord)]) -> Vec<usize> {
        (0..headers.len())
            .filter(|&c| !headers[c].is_empty() && !self.is_known(c, &headers[c]))
            .filter(|&c| {
                let mut cells = rows
                    .iter()
                    .map(|(_, r)| r.get(c).map(str::trim).unwrap_or(""))
                    .filter(|v| !v.is_empty())
                    .peekable();
                cells.peek().is_some() && cells.all(|v| v.parse::<f64>().is_ok())
            })
            .collect()
    }
}

fn required_number(row: usize, field: &str, value: &str) -> Result<f64> {
    value.parse().map_err(|_| ImportError::InvalidNumber {
        row,
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn optional_number(row: usize, field: &str, value: &str) -> Result<Option<f64>> {
    if value.is_empty() {
        return Ok(None);
    }
    required_number(row, field, value).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
proj_id,cost,benefit,region,exclusive_group,requires,social_score,labour,land,notes
P1,100,50,North,G1,,0.4,10,,first
P2,200,90,South,G1,P1,0.9,20,5,second
,,,,,,,,,
P3,50,30,North,,P1; P2 ,,,2.5,third
";

    #[test]
    fn parses_all_recognized_columns() {
        let dataset = parse_projects(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);

        let p2 = dataset.get("P2").unwrap();
        assert_eq!(p2.cost, 200.0);
        assert_eq!(p2.region.as_deref(), Some("South"));
        assert_eq!(p2.exclusive_group.as_deref(), Some("G1"));
        assert_eq!(p2.requires, vec!["P1"]);
        assert_eq!(p2.secondary_score, Some(0.9));

        let p3 = dataset.get("P3").unwrap();
        assert_eq!(p3.requires, vec!["P1", "P2"]);
        assert_eq!(p3.secondary_score, None);
        assert_eq!(p3.exclusive_group, None);
    }

    #[test]
    fn numeric_extra_columns_become_resources() {
        let dataset = parse_projects(SAMPLE.as_bytes()).unwrap();
        let names: Vec<&str> = dataset.resource_names().into_iter().collect();
        assert_eq!(names, vec!["labour", "land"]);
        assert_eq!(dataset.get("P1").unwrap().consumption("land"), 0.0);
        assert_eq!(dataset.get("P3").unwrap().consumption("land"), 2.5);
    }

    #[test]
    fn aliases_and_case_are_accepted() {
        let csv = "ID,Cost,Benefit,Secondary_Score,Priority\nA,1,2,3,4\n";
        let dataset = parse_projects(csv.as_bytes()).unwrap();
        let a = dataset.get("A").unwrap();
        assert_eq!(a.secondary_score, Some(3.0));
        assert_eq!(a.priority, Some(4.0));
        assert!(dataset.resource_names().is_empty());
    }

    #[test]
    fn missing_required_column() {
        let err = parse_projects("proj_id,cost\nA,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn(c) if c == "benefit"));
    }

    #[test]
    fn blank_id_is_rejected_with_row() {
        let err = parse_projects("proj_id,cost,benefit\nA,1,1\n ,2,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ImportError::BlankId { row: 3 }));
    }

    #[test]
    fn bad_number_names_the_field() {
        let err = parse_projects("proj_id,cost,benefit\nA,cheap,1\n".as_bytes()).unwrap_err();
        match err {
            ImportError::InvalidNumber { row, field, value } => {
                assert_eq!(row, 2);
                assert_eq!(field, "cost");
                assert_eq!(value, "cheap");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicates_survive_import_as_warnings() {
        let dataset = parse_projects("proj_id,cost,benefit\nA,1,1\nA,2,2\n".as_bytes()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.diagnostics().len(), 1);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let dataset = load_projects(file.path()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert!(matches!(
            load_projects("/definitely/not/here.csv"),
            Err(ImportError::Io(_))
        ));
    }
}
