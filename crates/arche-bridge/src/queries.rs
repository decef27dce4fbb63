//! The query functions behind the registry.
//!
//! Every function has the same signature so it fits in the static table.
//! Unknown or stale object ids produce [`QueryValue::Empty`] or empty lists;
//! only malformed arguments are errors. Trace queries go through the live
//! view, so dangling targets never show up as results.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use arche_persist::PersistError;
use arche_types::{AssetPath, ClassTag, ObjectId, TraceFilter};

use crate::context::RenderContext;
use crate::error::{BridgeError, BridgeResult};
use crate::value::{AssetPayload, MatrixView, ObjectSummary, ObjectView, QueryArgs, QueryValue};

/// The document being rendered, or empty outside a render.
pub fn current_document(ctx: &RenderContext<'_>, _args: &QueryArgs) -> BridgeResult<QueryValue> {
    Ok(match ctx.current_document {
        Some(id) if ctx.store.contains(&id) => QueryValue::Id(id),
        _ => QueryValue::Empty,
    })
}

/// `get_object(id)`: full view of one object.
pub fn get_object(ctx: &RenderContext<'_>, args: &QueryArgs) -> BridgeResult<QueryValue> {
    let id = required_id("get_object", args, 0)?;
    Ok(match ctx.store.try_get(&id) {
        Some(obj) => QueryValue::Object(Box::new(ObjectView::from(obj))),
        None => QueryValue::Empty,
    })
}

/// `get_objects_from_classes(classes)`: objects carrying any of the tags,
/// in document order, with labels. Malformed tags match nothing.
pub fn get_objects_from_classes(
    ctx: &RenderContext<'_>,
    args: &QueryArgs,
) -> BridgeResult<QueryValue> {
    let classes: Vec<ClassTag> = args
        .tokens(0)
        .into_iter()
        .filter_map(|t| ClassTag::new(t).ok())
        .collect();
    Ok(QueryValue::Listing(summaries(
        ctx,
        &ctx.store.objects_with_classes(&classes),
    )))
}

/// `check_dependency(a, b, [types])`: direct trace from `a` to `b`.
pub fn check_dependency(ctx: &RenderContext<'_>, args: &QueryArgs) -> BridgeResult<QueryValue> {
    let a = required_id("check_dependency", args, 0)?;
    let b = required_id("check_dependency", args, 1)?;
    let filter = type_filter(args, 2);
    Ok(QueryValue::Bool(ctx.live_traces().has_dependency(&a, &b, &filter)))
}

/// `calculate_impact(seed_ids, [types])`: indirectly affected ids in
/// discovery order.
pub fn calculate_impact(ctx: &RenderContext<'_>, args: &QueryArgs) -> BridgeResult<QueryValue> {
    let seeds = id_list("calculate_impact", args, 0)?;
    let filter = type_filter(args, 1);
    Ok(QueryValue::Ids(ctx.live_traces().impact_closure(&seeds, &filter)))
}

/// `targets_of(id, [types])`.
pub fn targets_of(ctx: &RenderContext<'_>, args: &QueryArgs) -> BridgeResult<QueryValue> {
    let id = required_id("targets_of", args, 0)?;
    Ok(QueryValue::Ids(ctx.live_traces().targets_of(&id, &type_filter(args, 1))))
}

/// `sources_of(id, [types])`.
pub fn sources_of(ctx: &RenderContext<'_>, args: &QueryArgs) -> BridgeResult<QueryValue> {
    let id = required_id("sources_of", args, 0)?;
    Ok(QueryValue::Ids(ctx.live_traces().sources_of(&id, &type_filter(args, 1))))
}

/// `dependency_matrix(row_classes, column_classes, [types])`: rows and
/// columns are the objects carrying the given class tags.
pub fn dependency_matrix(ctx: &RenderContext<'_>, args: &QueryArgs) -> BridgeResult<QueryValue> {
    let classes = |index| -> Vec<ClassTag> {
        args.tokens(index)
            .into_iter()
            .filter_map(|t| ClassTag::new(t).ok())
            .collect()
    };
    let rows = ctx.store.objects_with_classes(&classes(0));
    let columns = ctx.store.objects_with_classes(&classes(1));
    let matrix = ctx
        .live_traces()
        .dependency_matrix(&rows, &columns, &type_filter(args, 2));
    Ok(QueryValue::Matrix(MatrixView::new(
        matrix,
        summaries(ctx, &rows),
        summaries(ctx, &columns),
    )))
}

/// `resolve_asset(path)`: file content as base64, or empty when the asset
/// (or the asset store) is missing.
pub fn resolve_asset(ctx: &RenderContext<'_>, args: &QueryArgs) -> BridgeResult<QueryValue> {
    let raw = args
        .tokens(0)
        .first()
        .copied()
        .ok_or_else(|| bad("resolve_asset", "missing asset path"))?;
    let path = AssetPath::new(raw).map_err(|e| bad("resolve_asset", e.to_string()))?;
    let Some(assets) = ctx.assets else {
        return Ok(QueryValue::Empty);
    };
    let (info, bytes) = match assets.load(&path) {
        Ok(loaded) => loaded,
        Err(PersistError::AssetNotFound(_)) => return Ok(QueryValue::Empty),
        Err(e) => return Err(e.into()),
    };
    Ok(QueryValue::Asset(AssetPayload::new(info, STANDARD.encode(&bytes))))
}

// ---------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------

fn bad(query: &'static str, reason: impl Into<String>) -> BridgeError {
    BridgeError::BadArguments {
        query,
        reason: reason.into(),
    }
}

fn parse_id(query: &'static str, token: &str) -> BridgeResult<ObjectId> {
    token
        .parse()
        .map_err(|_| bad(query, format!("`{token}` is not an object id")))
}

fn required_id(query: &'static str, args: &QueryArgs, index: usize) -> BridgeResult<ObjectId> {
    match args.tokens(index).as_slice() {
        [token] => parse_id(query, token),
        [] => Err(bad(query, format!("missing argument {}", index + 1))),
        _ => Err(bad(query, format!("argument {} must be a single id", index + 1))),
    }
}

fn id_list(query: &'static str, args: &QueryArgs, index: usize) -> BridgeResult<Vec<ObjectId>> {
    args.tokens(index)
        .into_iter()
        .map(|t| parse_id(query, t))
        .collect()
}

/// Missing argument: every type. Present: only the well-formed tokens.
fn type_filter(args: &QueryArgs, index: usize) -> TraceFilter {
    match args.get(index) {
        None => TraceFilter::Any,
        Some(_) => TraceFilter::from_tokens(args.tokens(index)),
    }
}

fn summaries(ctx: &RenderContext<'_>, ids: &[ObjectId]) -> Vec<ObjectSummary> {
    ids.iter()
        .filter_map(|id| ctx.store.try_get(id))
        .map(ObjectSummary::from)
        .collect()
}
