//! Static table of named queries.
//!
//! The templating layer calls queries by name. Names are resolved against a
//! fixed table built at compile time; nothing is looked up by reflection
//! and nothing can be registered at run time.

use tracing::debug;

use crate::context::RenderContext;
use crate::error::{BridgeError, BridgeResult};
use crate::queries;
use crate::value::{QueryArgs, QueryValue};

/// Signature shared by every query.
pub type QueryFn = fn(&RenderContext<'_>, &QueryArgs) -> BridgeResult<QueryValue>;

/// One registered query.
#[derive(Clone, Copy)]
pub struct QueryDef {
    pub name: &'static str,
    /// Argument summary shown to template authors.
    pub signature: &'static str,
    pub run: QueryFn,
}

impl std::fmt::Debug for QueryDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryDef")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish()
    }
}

static STANDARD_QUERIES: &[QueryDef] = &[
    QueryDef {
        name: "current_document",
        signature: "()",
        run: queries::current_document,
    },
    QueryDef {
        name: "get_object",
        signature: "(id)",
        run: queries::get_object,
    },
    QueryDef {
        name: "get_objects_from_classes",
        signature: "(classes)",
        run: queries::get_objects_from_classes,
    },
    QueryDef {
        name: "check_dependency",
        signature: "(a, b, [types])",
        run: queries::check_dependency,
    },
    QueryDef {
        name: "calculate_impact",
        signature: "(seed_ids, [types])",
        run: queries::calculate_impact,
    },
    QueryDef {
        name: "resolve_asset",
        signature: "(path)",
        run: queries::resolve_asset,
    },
    QueryDef {
        name: "targets_of",
        signature: "(id, [types])",
        run: queries::targets_of,
    },
    QueryDef {
        name: "sources_of",
        signature: "(id, [types])",
        run: queries::sources_of,
    },
    QueryDef {
        name: "dependency_matrix",
        signature: "(row_classes, column_classes, [types])",
        run: queries::dependency_matrix,
    },
];

/// Name -> query dispatch over a static table.
#[derive(Clone, Copy, Debug)]
pub struct QueryRegistry {
    queries: &'static [QueryDef],
}

impl Default for QueryRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl QueryRegistry {
    /// The built-in query set.
    pub fn standard() -> Self {
        Self {
            queries: STANDARD_QUERIES,
        }
    }

    /// Registered queries in table order.
    pub fn queries(&self) -> &'static [QueryDef] {
        self.queries
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn lookup(&self, name: &str) -> Option<&'static QueryDef> {
        self.queries.iter().find(|q| q.name == name)
    }

    /// Run query `name`.
    pub fn call(
        &self,
        ctx: &RenderContext<'_>,
        name: &str,
        args: &QueryArgs,
    ) -> BridgeResult<QueryValue> {
        let query = self
            .lookup(name)
            .ok_or_else(|| BridgeError::UnknownQuery(name.to_string()))?;
        debug!(query = name, args = args.len(), "bridge query");
        (query.run)(ctx, args)
    }

    /// Run a query with JSON arguments and return a JSON result.
    pub fn call_json(
        &self,
        ctx: &RenderContext<'_>,
        name: &str,
        args_json: &str,
    ) -> BridgeResult<String> {
        let args: QueryArgs = if args_json.trim().is_empty() {
            QueryArgs::new()
        } else {
            serde_json::from_str(args_json).map_err(|e| BridgeError::Serialization(e.to_string()))?
        };
        let value = self.call(ctx, name, &args)?;
        serde_json::to_string(&value).map_err(|e| BridgeError::Serialization(e.to_string()))
    }
}
