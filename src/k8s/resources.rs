/// Parsed output of `kubectl api-resources`
use super::KubectlError;

/// A single API resource known to the cluster
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResource {
    pub name: String,
    pub short_names: Vec<String>,
    pub api_version: Option<String>,
    /// API group, `None` for the core group
    pub group: Option<String>,
    pub namespaced: bool,
    pub kind: String,
    pub verbs: Vec<String>,
}

/// The set of API resources served by a cluster, queryable by kind
#[derive(Debug, Clone, Default)]
pub struct ApiResources {
    resources: Vec<ApiResource>,
}

/// Column start offsets taken from the header row
struct Columns {
    headers: Vec<(String, usize)>,
}

impl Columns {
    fn from_header(line: &str) -> Self {
        let mut headers = Vec::new();
        let mut start = None;

        for (idx, ch) in line.char_indices() {
            match (ch.is_whitespace(), start) {
                (false, None) => start = Some(idx),
                (true, Some(s)) => {
                    headers.push((line[s..idx].to_string(), s));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            headers.push((line[s..].to_string(), s));
        }

        Self { headers }
    }

    fn has(&self, name: &str) -> bool {
        self.headers.iter().any(|(h, _)| h == name)
    }

    /// Cell text for `name` in `row`, empty when the row is too short
    fn cell<'a>(&self, row: &'a str, name: &str) -> &'a str {
        let Some(pos) = self.headers.iter().position(|(h, _)| h == name) else {
            return "";
        };
        let start = self.headers[pos].1;
        let end = self
            .headers
            .get(pos + 1)
            .map(|(_, offset)| *offset)
            .unwrap_or(row.len())
            .min(row.len());

        row.get(start..end).map(str::trim).unwrap_or("")
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .trim_matches(|c| c == '[' || c == ']')
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl ApiResources {
    pub fn new(resources: Vec<ApiResource>) -> Self {
        Self { resources }
    }

    /// Parse the table printed by `kubectl api-resources -o wide`
    ///
    /// Both the current `APIVERSION` layout and the older `APIGROUP` layout
    /// are accepted. Empty input yields an empty set.
    pub fn parse(output: &str) -> Result<Self, KubectlError> {
        let mut lines = output.lines().filter(|l| !l.trim().is_empty());

        let Some(header) = lines.next() else {
            return Ok(Self::default());
        };

        let columns = Columns::from_header(header);
        if !columns.has("NAME") || !columns.has("KIND") {
            return Err(KubectlError::Parse(format!(
                "unexpected api-resources header: {}",
                header.trim()
            )));
        }

        let resources = lines
            .map(|row| {
                let api_version = Some(columns.cell(row, "APIVERSION"))
                    .filter(|v| !v.is_empty())
                    .map(str::to_string);

                let group = if columns.has("APIVERSION") {
                    api_version
                        .as_deref()
                        .and_then(|v| v.rsplit_once('/'))
                        .map(|(group, _)| group.to_string())
                } else {
                    Some(columns.cell(row, "APIGROUP"))
                        .filter(|g| !g.is_empty())
                        .map(str::to_string)
                };

                ApiResource {
                    name: columns.cell(row, "NAME").to_string(),
                    short_names: split_list(columns.cell(row, "SHORTNAMES")),
                    api_version,
                    group,
                    namespaced: columns.cell(row, "NAMESPACED").eq_ignore_ascii_case("true"),
                    kind: columns.cell(row, "KIND").to_string(),
                    verbs: split_list(columns.cell(row, "VERBS")),
                }
            })
            .collect();

        Ok(Self { resources })
    }

    /// Look up a resource by its kind
    pub fn get(&self, kind: &str) -> Option<&ApiResource> {
        self.resources.iter().find(|r| r.kind == kind)
    }

    /// API group for `kind`; `None` when the kind is unknown or in the core group
    pub fn get_api_group(&self, kind: &str) -> Option<&str> {
        self.get(kind).and_then(|r| r.group.as_deref())
    }

    #[allow(dead_code)]
    pub fn is_namespaced(&self, kind: &str) -> Option<bool> {
        self.get(kind).map(|r| r.namespaced)
    }

    #[allow(dead_code)]
    pub fn get_verbs(&self, kind: &str) -> Option<&[String]> {
        self.get(kind).map(|r| r.verbs.as_slice())
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
