//! Static table registry: the allow-list of tables the data API serves, with each table's
//! ordered column declaration. Both the collection and item handlers resolve tables here.

/// Column kind. Decides the SQL cast applied to bound parameters and the JSON value kinds accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Uuid,
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Date,
    Json,
}

impl ColumnKind {
    /// PostgreSQL type name used in DDL and in `$n::type` casts.
    pub fn pg_type(self) -> &'static str {
        match self {
            ColumnKind::Uuid => "uuid",
            ColumnKind::Text => "text",
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "double precision",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Timestamp => "timestamptz",
            ColumnKind::Date => "date",
            ColumnKind::Json => "jsonb",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
    /// SQL default expression; when set, INSERT omits the column unless the record supplies it.
    pub default: Option<&'static str>,
    /// Maintained by the server; never written from an update body.
    pub managed: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

pub const ID_COLUMN: &str = "id";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        let columns: &'static [ColumnDef] = self.columns;
        columns.iter().find(|c| c.name == name)
    }

    /// Columns a request body may set on update, in declaration order.
    pub fn writable_columns(&self) -> impl Iterator<Item = &'static ColumnDef> {
        let columns: &'static [ColumnDef] = self.columns;
        columns.iter().filter(|c| !c.managed)
    }
}

const fn col(name: &'static str, kind: ColumnKind) -> ColumnDef {
    ColumnDef {
        name,
        kind,
        nullable: true,
        default: None,
        managed: false,
    }
}

const fn required(name: &'static str, kind: ColumnKind) -> ColumnDef {
    ColumnDef {
        name,
        kind,
        nullable: false,
        default: None,
        managed: false,
    }
}

const fn with_default(name: &'static str, kind: ColumnKind, default: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        kind,
        nullable: false,
        default: Some(default),
        managed: false,
    }
}

const ID: ColumnDef = ColumnDef {
    name: ID_COLUMN,
    kind: ColumnKind::Uuid,
    nullable: false,
    default: Some("gen_random_uuid()"),
    managed: true,
};

const CREATED_AT: ColumnDef = ColumnDef {
    name: CREATED_AT_COLUMN,
    kind: ColumnKind::Timestamp,
    nullable: false,
    default: Some("NOW()"),
    managed: true,
};

const UPDATED_AT: ColumnDef = ColumnDef {
    name: UPDATED_AT_COLUMN,
    kind: ColumnKind::Timestamp,
    nullable: false,
    default: Some("NOW()"),
    managed: true,
};

const USER_ID: ColumnDef = required("user_id", ColumnKind::Text);

use ColumnKind::*;

pub static TABLES: &[TableDef] = &[
    TableDef {
        name: "users",
        columns: &[
            ID,
            required("email", Text),
            col("full_name", Text),
            col("avatar_url", Text),
            col("timezone", Text),
            with_default("onboarding_completed", Boolean, "false"),
            CREATED_AT,
            UPDATED_AT,
        ],
    },
    TableDef {
        name: "identity_profiles",
        columns: &[
            ID,
            USER_ID,
            col("core_values", Json),
            col("strengths", Json),
            col("growth_areas", Json),
            col("life_purpose", Text),
            col("personality_type", Text),
            CREATED_AT,
            UPDATED_AT,
        ],
    },
    TableDef {
        name: "sensory_preferences",
        columns: &[
            ID,
            USER_ID,
            col("light_sensitivity", Integer),
            col("sound_sensitivity", Integer),
            col("texture_preferences", Json),
            col("preferred_environment", Text),
            CREATED_AT,
            UPDATED_AT,
        ],
    },
    TableDef {
        name: "mood_entries",
        columns: &[
            ID,
            USER_ID,
            required("mood_score", Integer),
            col("energy_level", Integer),
            col("emotions", Json),
            col("triggers", Json),
            col("notes", Text),
            CREATED_AT,
            UPDATED_AT,
        ],
    },
    TableDef {
        name: "emotional_patterns",
        columns: &[
            ID,
            USER_ID,
            required("pattern_type", Text),
            col("description", Text),
            col("frequency", Text),
            col("intensity", Integer),
            col("detected_at", Timestamp),
            CREATED_AT,
            UPDATED_AT,
        ],
    },
    TableDef {
        name: "wellness_metrics",
        columns: &[
            ID,
            USER_ID,
            required("metric_type", Text),
            required("value", Float),
            col("unit", Text),
            with_default("recorded_at", Timestamp, "NOW()"),
            CREATED_AT,
            UPDATED_AT,
        ],
    },
    TableDef {
        name: "activities",
        columns: &[
            ID,
            USER_ID,
            required("activity_type", Text),
            col("title", Text),
            col("duration_minutes", Integer),
            with_default("completed", Boolean, "false"),
            col("metadata", Json),
            CREATED_AT,
            UPDATED_AT,
        ],
    },
    TableDef {
        name: "recovery_sessions",
        columns: &[
            ID,
            USER_ID,
            required("session_type", Text),
            col("duration_minutes", Integer),
            col("quality_rating", Integer),
            col("notes", Text),
            CREATED_AT,
            UPDATED_AT,
        ],
    },
    TableDef {
        name: "burnout_metrics",
        columns: &[
            ID,
            USER_ID,
            col("exhaustion_level", Integer),
            col("cynicism_level", Integer),
            col("efficacy_level", Integer),
            col("overall_score", Float),
            CREATED_AT,
            UPDATED_AT,
        ],
    },
    TableDef {
        name: "communication_entries",
        columns: &[
            ID,
            USER_ID,
            required("entry_type", Text),
            col("content", Text),
            col("sentiment", Text),
            col("clarity_score", Integer),
            CREATED_AT,
            UPDATED_AT,
        ],
    },
    TableDef {
        name: "speaking_practice",
        columns: &[
            ID,
            USER_ID,
            col("topic", Text),
            col("duration_seconds", Integer),
            col("filler_word_count", Integer),
            col("confidence_rating", Integer),
            col("recording_url", Text),
            CREATED_AT,
            UPDATED_AT,
        ],
    },
    TableDef {
        name: "eco_habits",
        columns: &[
            ID,
            USER_ID,
            required("habit_name", Text),
            col("category", Text),
            col("frequency", Text),
            with_default("streak_days", Integer, "0"),
            with_default("is_active", Boolean, "true"),
            CREATED_AT,
            UPDATED_AT,
        ],
    },
    TableDef {
        name: "carbon_footprint",
        columns: &[
            ID,
            USER_ID,
            required("category", Text),
            required("amount_kg", Float),
            col("activity_date", Date),
            col("source", Text),
            CREATED_AT,
            UPDATED_AT,
        ],
    },
    TableDef {
        name: "user_progress",
        columns: &[
            ID,
            USER_ID,
            required("module_name", Text),
            with_default("progress_percentage", Integer, "0"),
            with_default("level", Integer, "1"),
            with_default("points", Integer, "0"),
            col("achievements", Json),
            col("last_activity_at", Timestamp),
            CREATED_AT,
            UPDATED_AT,
        ],
    },
];

/// Look up an allow-listed table by name.
pub fn lookup(name: &str) -> Option<&'static TableDef> {
    TABLES.iter().find(|t| t.name == name)
}

/// Allow-listed table names in registry order.
pub fn names() -> Vec<&'static str> {
    TABLES.iter().map(|t| t.name).collect()
}
