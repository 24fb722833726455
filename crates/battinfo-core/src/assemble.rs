//! Document assembly: required fields, the fixed skeleton, and row dispatch.

use std::fmt;

use serde::Serialize;

use crate::builder::{self, Attachment, BuildContext, Row, Unit};
use crate::config::Settings;
use crate::node::{
    Context, Document, Node, NodeValue, Scalar, COMMENT_KEY, ID_KEY, TYPE_KEY,
};
use crate::workbook::{SchemaRow, Workbook};
use crate::ConvertError;

pub const CELL_TYPE: &str = "Cell type";
pub const CELL_ID: &str = "Cell ID";
pub const ASSEMBLY_DATE: &str = "Date of cell assembly";
pub const INSTITUTION: &str = "Institution/company";
pub const OPERATOR: &str = "Scientist/technician/operator";

/// Schema fields that must be filled before anything is converted.
pub const REQUIRED_FIELDS: [&str; 5] = [CELL_TYPE, CELL_ID, ASSEMBLY_DATE, INSTITUTION, OPERATOR];

/// Link markers with special handling.
const NOT_ONTOLOGIZE: &str = "NotOntologize";
const COMMENT_LINK: &str = "Comment";
const PRODUCT_ID_KEY: &str = "schema:productID";
const MANUFACTURER_KEY: &str = "schema:manufacturer";

const PERSON_TYPE: &str = "schema:Person";
const ORGANIZATION_TYPE: &str = "schema:Organization";
const NAME_KEY: &str = "schema:name";

/// How a schema row was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowOutcome {
    Empty,
    NotOntologized,
    /// A value with no ontology link.
    Unlinked,
    TopLevelComment,
    ProductId,
    Manufacturer,
    Quantity,
    Identifier,
    Comment,
    Traversed,
}

impl RowOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowOutcome::Empty => "empty",
            RowOutcome::NotOntologized => "not-ontologized",
            RowOutcome::Unlinked => "unlinked",
            RowOutcome::TopLevelComment => "top-level-comment",
            RowOutcome::ProductId => "product-id",
            RowOutcome::Manufacturer => "manufacturer",
            RowOutcome::Quantity => "quantity",
            RowOutcome::Identifier => "identifier",
            RowOutcome::Comment => "comment",
            RowOutcome::Traversed => "traversed",
        }
    }

    /// Whether the row put its value into the document.
    pub fn is_written(&self) -> bool {
        !matches!(
            self,
            RowOutcome::Empty | RowOutcome::NotOntologized | RowOutcome::Unlinked
        )
    }
}

impl fmt::Display for RowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Attachment> for RowOutcome {
    fn from(attachment: Attachment) -> Self {
        match attachment {
            Attachment::Skipped => RowOutcome::Empty,
            Attachment::Quantity => RowOutcome::Quantity,
            Attachment::Identifier => RowOutcome::Identifier,
            Attachment::Comment => RowOutcome::Comment,
            Attachment::Traversed => RowOutcome::Traversed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowReport {
    /// Line in the schema sheet; the header is line 1.
    pub line: usize,
    pub metadata: String,
    pub link: String,
    pub outcome: RowOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    pub rows: Vec<RowReport>,
}

impl ConversionReport {
    pub fn count(&self, outcome: RowOutcome) -> usize {
        self.rows.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn written(&self) -> usize {
        self.rows.iter().filter(|r| r.outcome.is_written()).count()
    }
}

/// A finished conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub document: Document,
    pub report: ConversionReport,
}

/// Values of the required fields, checked up front.
struct RequiredFields<'w> {
    cell_type: &'w Scalar,
    cell_id: &'w Scalar,
    assembly_date: &'w Scalar,
    institution: &'w Scalar,
    institution_id: &'w str,
    operator: &'w Scalar,
    operator_id: &'w str,
}

impl<'w> RequiredFields<'w> {
    fn collect(workbook: &'w Workbook) -> Result<Self, ConvertError> {
        let field = move |name: &str| -> Result<&'w Scalar, ConvertError> {
            workbook
                .value_of(name)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ConvertError::MissingRequiredField {
                    field: name.to_string(),
                })
        };
        let unique_id = move |name: &str, value: &Scalar| -> Result<&'w str, ConvertError> {
            let text = value.to_string();
            workbook
                .tables
                .unique_id(&text)
                .ok_or_else(|| ConvertError::MissingUniqueId {
                    field: name.to_string(),
                    value: text,
                })
        };

        let cell_type = field(CELL_TYPE)?;
        let cell_id = field(CELL_ID)?;
        let assembly_date = field(ASSEMBLY_DATE)?;
        let institution = field(INSTITUTION)?;
        let operator = field(OPERATOR)?;

        Ok(Self {
            cell_type,
            cell_id,
            assembly_date,
            institution,
            institution_id: unique_id(INSTITUTION, institution)?,
            operator,
            operator_id: unique_id(OPERATOR, operator)?,
        })
    }
}

/// Convert a workbook into a JSON-LD document.
pub fn build(workbook: &Workbook, settings: &Settings) -> Result<Conversion, ConvertError> {
    let started = chrono::Local::now();
    log::info!(
        "Initialize new session of workbook conversion, started at {}",
        started.format("%Y-%m-%d %H:%M:%S%.3f")
    );

    let fields = RequiredFields::collect(workbook)?;
    let schema_version = workbook
        .value_of(&settings.schema_version_field)
        .filter(|value| !value.is_empty());

    let mut root = skeleton(&fields, schema_version);
    let mut ctx = BuildContext::new(&workbook.tables, settings);
    let mut report = ConversionReport::default();

    for (idx, row) in workbook.rows.iter().enumerate() {
        let outcome = dispatch(&mut ctx, &mut root, row)?;
        log::debug!("Row '{}' ({}) -> {outcome}", row.metadata, row.link);
        report.rows.push(RowReport {
            line: idx + 2,
            metadata: row.metadata.clone(),
            link: row.link.clone(),
            outcome,
        });
    }

    let credit = settings.software_credit(schema_version.map(|v| v.to_string()).as_deref());
    root.insert(COMMENT_KEY, credit);

    let document = Document {
        context: Context {
            base: settings.context_base.clone(),
            terms: workbook.context_terms.clone(),
        },
        root,
    };

    log::info!(
        "Conversion finished: {} of {} rows written in {} ms",
        report.written(),
        report.rows.len(),
        (chrono::Local::now() - started).num_milliseconds()
    );
    Ok(Conversion { document, report })
}

fn skeleton(fields: &RequiredFields<'_>, schema_version: Option<&Scalar>) -> Node {
    let mut root = Node::new().with(TYPE_KEY, fields.cell_type.clone());
    if let Some(version) = schema_version {
        root.insert("schema:version", version.clone());
    }
    root.with(PRODUCT_ID_KEY, fields.cell_id.clone())
        .with("schema:dateCreated", fields.assembly_date.clone())
        .with(
            "schema:creator",
            Node::typed(PERSON_TYPE)
                .with(ID_KEY, fields.operator_id)
                .with(NAME_KEY, fields.operator.clone()),
        )
        .with(
            MANUFACTURER_KEY,
            Node::typed(ORGANIZATION_TYPE)
                .with(ID_KEY, fields.institution_id)
                .with(NAME_KEY, fields.institution.clone()),
        )
        .with(COMMENT_KEY, Node::new())
}

fn dispatch(
    ctx: &mut BuildContext<'_>,
    root: &mut Node,
    row: &SchemaRow,
) -> Result<RowOutcome, ConvertError> {
    if row.value.is_empty() {
        return Ok(RowOutcome::Empty);
    }
    match row.link.as_str() {
        NOT_ONTOLOGIZE => return Ok(RowOutcome::NotOntologized),
        "" => {
            log::warn!("Row '{}' has a value but no ontology link, skipping", row.metadata);
            return Ok(RowOutcome::Unlinked);
        }
        COMMENT_LINK => {
            root.insert(COMMENT_KEY, format!("{}: {}", row.metadata, row.value));
            return Ok(RowOutcome::TopLevelComment);
        }
        _ => {}
    }

    let parsed = Row::new(&row.link, row.value.clone(), row.unit.clone(), &row.metadata)?;

    if row.link.contains(PRODUCT_ID_KEY) {
        let Some(last) = parsed.segments.last() else {
            return Ok(RowOutcome::Traversed);
        };
        let target = builder::walk(ctx, root, &parsed, parsed.segments.len() - 1)?;
        target.insert(last.type_name(), row.value.to_string().trim());
        return Ok(RowOutcome::ProductId);
    }

    if row.link.contains(MANUFACTURER_KEY) {
        let at = parsed
            .segments
            .iter()
            .position(|s| s.key() == Some(MANUFACTURER_KEY))
            .unwrap_or(parsed.segments.len().saturating_sub(1));
        let parent = builder::walk(ctx, root, &parsed, at)?;
        let key = parsed.segments[at].type_name();
        let organization = Node::typed(ORGANIZATION_TYPE).with(NAME_KEY, row.value.clone());
        // An identified organization keeps its own name; the row's
        // organization is nested below it.
        let identified = parent
            .get_mut(key)
            .and_then(NodeValue::as_node_mut)
            .filter(|node| node.contains_key(ID_KEY));
        match identified {
            Some(existing) => existing.insert(MANUFACTURER_KEY, organization),
            None => parent.insert(key, organization),
        }
        return Ok(RowOutcome::Manufacturer);
    }

    if row.unit == Unit::Missing {
        return Err(ConvertError::MissingUnit {
            value: row.value.to_string(),
            path: row.link.clone(),
        });
    }

    builder::apply(ctx, root, &parsed).map(RowOutcome::from)
}
