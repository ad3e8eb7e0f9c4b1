use itertools::Itertools;
use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator};

/// `(column, SQL type)` in the column order of the source file.
pub type ColumnDef = (&'static str, &'static str);

const SUB_COLUMNS: &[ColumnDef] = &[
    ("adsh", "TEXT(20) NOT NULL"),
    ("cik", "INTEGER(10) NOT NULL"),
    ("name", "TEXT(150) NOT NULL"),
    ("sic", "INTEGER(4)"),
    ("countryba", "TEXT(2) NOT NULL"),
    ("stprba", "TEXT(2)"),
    ("cityba", "TEXT(30) NOT NULL"),
    ("zipba", "TEXT(10)"),
    ("bas1", "TEXT(40)"),
    ("bas2", "TEXT(40)"),
    ("baph", "TEXT(20)"),
    ("countryma", "TEXT(2)"),
    ("stprma", "TEXT(2)"),
    ("cityma", "TEXT(30)"),
    ("zipma", "TEXT(10)"),
    ("mas1", "TEXT(40)"),
    ("mas2", "TEXT(40)"),
    ("countryinc", "TEXT(3) NOT NULL"),
    ("stprinc", "TEXT(2)"),
    ("ein", "INTEGER(10)"),
    ("former", "TEXT(150)"),
    ("changed", "TEXT(8)"),
    ("afs", "TEXT(5)"),
    ("wksi", "BOOLEAN NOT NULL"),
    ("fye", "TEXT(4) NOT NULL"),
    ("form", "TEXT(10) NOT NULL"),
    ("period", "DATE(8) NOT NULL"),
    ("fy", "TEXT(4) NOT NULL"),
    ("fp", "TEXT(2) NOT NULL"),
    ("filed", "DATE(8) NOT NULL"),
    ("accepted", "DATE(19) NOT NULL"),
    ("prevrpt", "BOOLEAN NOT NULL"),
    ("detail", "BOOLEAN NOT NULL"),
    ("instance", "TEXT(32) NOT NULL"),
    ("nciks", "INTEGER(4) NOT NULL"),
    ("aciks", "TEXT(120)"),
];

const TAG_COLUMNS: &[ColumnDef] = &[
    ("tag", "TEXT(256) NOT NULL"),
    ("version", "TEXT(20) NOT NULL"),
    ("custom", "BOOLEAN NOT NULL"),
    ("abstract", "BOOLEAN NOT NULL"),
    ("datatype", "TEXT(20)"),
    ("iord", "TEXT(1) NOT NULL"),
    ("crdr", "TEXT(1)"),
    ("tlabel", "TEXT(512)"),
    ("doc", "TEXT"),
];

const NUM_COLUMNS: &[ColumnDef] = &[
    ("adsh", "TEXT(20) NOT NULL"),
    ("tag", "TEXT(256) NOT NULL"),
    ("version", "TEXT(20) NOT NULL"),
    ("ddate", "DATE(8) NOT NULL"),
    ("qtrs", "INTEGER(8) NOT NULL"),
    ("uom", "TEXT(20) NOT NULL"),
    ("coreg", "TEXT(256)"),
    ("value", "NUMERIC(16)"),
    ("footnote", "TEXT(512)"),
];

const PRE_COLUMNS: &[ColumnDef] = &[
    ("adsh", "TEXT(20) NOT NULL"),
    ("report", "INTEGER(6) NOT NULL"),
    ("line", "INTEGER(6) NOT NULL"),
    ("stmt", "TEXT(2) NOT NULL"),
    ("inpth", "BOOLEAN NOT NULL"),
    ("rfile", "TEXT(1) NOT NULL"),
    ("tag", "TEXT(256)"),
    ("version", "TEXT(20)"),
    ("plabel", "TEXT(512)"),
    ("negating", "TEXT"),
];

/// The four tables of a Financial Statement Data Set, in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Sub,
    Pre,
    Tag,
    Num,
}

impl Table {
    pub fn all() -> impl Iterator<Item = Table> {
        Table::iter()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Table::Sub => "sub",
            Table::Pre => "pre",
            Table::Tag => "tag",
            Table::Num => "num",
        }
    }

    /// Source file inside a quarter directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Table::Sub => "sub.txt",
            Table::Pre => "pre.txt",
            Table::Tag => "tag.txt",
            Table::Num => "num.txt",
        }
    }

    pub fn columns(&self) -> &'static [ColumnDef] {
        match self {
            Table::Sub => SUB_COLUMNS,
            Table::Pre => PRE_COLUMNS,
            Table::Tag => TAG_COLUMNS,
            Table::Num => NUM_COLUMNS,
        }
    }

    pub fn primary_key(&self) -> &'static [&'static str] {
        match self {
            Table::Sub => &["adsh"],
            Table::Pre => &["adsh", "report", "line"],
            Table::Tag => &["tag", "version"],
            Table::Num => &["adsh", "tag", "version", "ddate", "qtrs", "uom", "coreg"],
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns().iter().any(|(name, _)| *name == column)
    }

    pub fn create_sql(&self) -> String {
        let columns = self
            .columns()
            .iter()
            .map(|(name, ty)| format!("{} {}", quote_ident(name), ty))
            .join(",\n    ");
        let key = self.primary_key().iter().map(|c| quote_ident(c)).join(", ");
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {},\n    PRIMARY KEY ({})\n);",
            quote_ident(self.name()),
            columns,
            key
        )
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {};", quote_ident(self.name()))
    }
}

/// Double-quotes an SQL identifier. Some column names (`abstract`, `line`, `value`) are keywords.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
