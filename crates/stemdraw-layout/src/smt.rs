use crate::geometry::{solvable, Centers};
use std::collections::{BTreeSet, HashMap};
use stemdraw_core::{
    constraint::{distance_pairs, pair_key},
    Constraint, ConstraintKind, DistanceSpec, Priority, Scene,
};
use z3::ast::{Ast, Bool, Real};
use z3::{Config, Context, Optimize, SatResult};

/// Result of an SMT solve: positions plus how many constraints had to be
/// dropped to reach satisfiability.
pub struct SmtOutcome {
    pub centers: Centers,
    pub dropped: usize,
}

/// Tier 1: encode the scene as real-valued center coordinates with
/// pairwise non-overlap disjunctions and one formula per constraint,
/// then optimize lexicographically: first minimal travel from the seed
/// positions, then minimal spread around the canvas center.
///
/// On unsat the lowest-priority constraints are dropped one at a time
/// (low, then high); if the critical-only core is still unsat the tier
/// reports failure and the cascade falls through.
pub fn solve(scene: &Scene, seeds: &Centers, timeout_ms: u64) -> Option<SmtOutcome> {
    let mut active: Vec<&Constraint> = scene.constraints.iter().collect();
    let mut dropped = 0usize;

    loop {
        match try_solve(scene, seeds, &active, timeout_ms) {
            SolveResult::Sat(centers) => {
                return Some(SmtOutcome { centers, dropped });
            }
            SolveResult::Unknown => {
                tracing::warn!("SMT tier timed out, falling through");
                return None;
            }
            SolveResult::Unsat => {
                // drop the lowest-priority constraint still active
                let victim = active
                    .iter()
                    .position(|c| c.priority == Priority::Low)
                    .or_else(|| active.iter().position(|c| c.priority == Priority::High));
                match victim {
                    Some(index) => {
                        let gone = active.remove(index);
                        dropped += 1;
                        tracing::debug!(kind = ?gone.kind, "dropped constraint to regain satisfiability");
                    }
                    None => {
                        tracing::warn!("SMT unsat at critical-only, falling through");
                        return None;
                    }
                }
            }
        }
    }
}

enum SolveResult {
    Sat(Centers),
    Unsat,
    Unknown,
}

fn try_solve(
    scene: &Scene,
    seeds: &Centers,
    active: &[&Constraint],
    timeout_ms: u64,
) -> SolveResult {
    let mut config = Config::new();
    config.set_param_value("timeout", &timeout_ms.to_string());
    let ctx = Context::new(&config);
    let opt = Optimize::new(&ctx);

    let mut xs: HashMap<&str, Real> = HashMap::new();
    let mut ys: HashMap<&str, Real> = HashMap::new();
    let objects: Vec<_> = solvable(scene).collect();

    for object in &objects {
        let x = Real::new_const(&ctx, format!("x_{}", object.id));
        let y = Real::new_const(&ctx, format!("y_{}", object.id));
        let half_w = real(&ctx, object.dimensions.width() / 2.0);
        let half_h = real(&ctx, object.dimensions.height() / 2.0);
        opt.assert(&x.ge(&half_w));
        opt.assert(&x.le(&(real(&ctx, scene.canvas.width) - &half_w)));
        opt.assert(&y.ge(&half_h));
        opt.assert(&y.le(&(real(&ctx, scene.canvas.height) - &half_h)));
        xs.insert(object.id.as_str(), x);
        ys.insert(object.id.as_str(), y);
    }

    // default pairwise non-overlap, relaxed where a containment or
    // adjacency covers the pair
    let relaxed: BTreeSet<(String, String)> = scene
        .constraints
        .iter()
        .filter(|c| c.relaxes_overlap())
        .flat_map(|c| {
            let ids = c.object_ids();
            let mut pairs = Vec::new();
            for i in 0..ids.len() {
                for j in (i + 1)..ids.len() {
                    pairs.push(pair_key(ids[i], ids[j]));
                }
            }
            pairs
        })
        .collect();

    for i in 0..objects.len() {
        for j in (i + 1)..objects.len() {
            let (a, b) = (objects[i], objects[j]);
            if relaxed.contains(&pair_key(&a.id, &b.id)) {
                continue;
            }
            let (xa, ya) = (&xs[a.id.as_str()], &ys[a.id.as_str()]);
            let (xb, yb) = (&xs[b.id.as_str()], &ys[b.id.as_str()]);
            let sep_x = real(&ctx, (a.dimensions.width() + b.dimensions.width()) / 2.0);
            let sep_y = real(&ctx, (a.dimensions.height() + b.dimensions.height()) / 2.0);
            let left = (xa + &sep_x).le(xb);
            let right = (xb + &sep_x).le(xa);
            let above = (ya + &sep_y).le(yb);
            let below = (yb + &sep_y).le(ya);
            opt.assert(&Bool::or(&ctx, &[&left, &right, &above, &below]));
        }
    }

    let governed = distance_pairs(&scene.constraints);
    for constraint in active {
        if let Some(formula) = encode(&ctx, scene, constraint, &governed, &xs, &ys) {
            opt.assert(&formula);
        }
    }

    // lexicographic objective: travel from seeds, then spread
    let mut travel = real(&ctx, 0.0);
    let mut spread = real(&ctx, 0.0);
    let (cx, cy) = (scene.canvas.width / 2.0, scene.canvas.height / 2.0);
    for object in &objects {
        let (x, y) = (&xs[object.id.as_str()], &ys[object.id.as_str()]);
        if let Some(&(sx, sy)) = seeds.get(&object.id) {
            let dx = x - &real(&ctx, sx);
            let dy = y - &real(&ctx, sy);
            travel = &travel + &(&dx * &dx) + &(&dy * &dy);
        }
        let ex = x - &real(&ctx, cx);
        let ey = y - &real(&ctx, cy);
        spread = &spread + &(&ex * &ex) + &(&ey * &ey);
    }
    opt.minimize(&travel);
    opt.minimize(&spread);

    match opt.check(&[]) {
        SatResult::Sat => {
            let Some(model) = opt.get_model() else {
                return SolveResult::Unknown;
            };
            let mut centers = Centers::new();
            for object in &objects {
                let x = eval(&model, &xs[object.id.as_str()]);
                let y = eval(&model, &ys[object.id.as_str()]);
                match (x, y) {
                    (Some(x), Some(y)) => {
                        centers.insert(object.id.clone(), (x, y));
                    }
                    _ => return SolveResult::Unknown,
                }
            }
            SolveResult::Sat(centers)
        }
        SatResult::Unsat => SolveResult::Unsat,
        SatResult::Unknown => SolveResult::Unknown,
    }
}

fn real(ctx: &Context, v: f64) -> Real {
    // millipixel precision is plenty for layout
    Real::from_real(ctx, (v * 1000.0).round() as i32, 1000)
}

fn eval<'ctx>(model: &z3::Model<'ctx>, var: &Real<'ctx>) -> Option<f64> {
    let value = model.eval(var, true)?;
    let (num, den) = value.as_real()?;
    if den == 0 {
        return None;
    }
    Some(num as f64 / den as f64)
}

fn encode<'ctx>(
    ctx: &'ctx Context,
    scene: &Scene,
    constraint: &Constraint,
    governed: &BTreeSet<(String, String)>,
    xs: &HashMap<&str, Real<'ctx>>,
    ys: &HashMap<&str, Real<'ctx>>,
) -> Option<Bool<'ctx>> {
    let x = |id: &str| xs.get(id).cloned();
    let y = |id: &str| ys.get(id).cloned();
    let half_w = |id: &str| scene.object(id).map(|o| o.dimensions.width() / 2.0);
    let half_h = |id: &str| scene.object(id).map(|o| o.dimensions.height() / 2.0);

    match &constraint.kind {
        ConstraintKind::AlignedHorizontally { ids } => {
            let mut clauses = Vec::new();
            for pair in ids.windows(2) {
                if governed.contains(&pair_key(&pair[0], &pair[1])) {
                    // distance owns this pair; the aligner defers
                    continue;
                }
                clauses.push(y(&pair[0])?._eq(&y(&pair[1])?));
            }
            and_all(ctx, clauses)
        }
        ConstraintKind::AlignedVertically { ids } => {
            let mut clauses = Vec::new();
            for pair in ids.windows(2) {
                if governed.contains(&pair_key(&pair[0], &pair[1])) {
                    continue;
                }
                clauses.push(x(&pair[0])?._eq(&x(&pair[1])?));
            }
            and_all(ctx, clauses)
        }
        // rotation-only; nothing to encode over centers
        ConstraintKind::Parallel { .. } => None,
        ConstraintKind::Distance { a, b, spec } => {
            let dx = &x(a)? - &x(b)?;
            let dy = &y(a)? - &y(b)?;
            let squared = &(&dx * &dx) + &(&dy * &dy);
            Some(match spec {
                DistanceSpec::Exact(d) => squared._eq(&real(ctx, d * d)),
                DistanceSpec::Range { min, max } => {
                    let mut clauses = Vec::new();
                    if let Some(lo) = min {
                        clauses.push(squared.ge(&real(ctx, lo * lo)));
                    }
                    if let Some(hi) = max {
                        clauses.push(squared.le(&real(ctx, hi * hi)));
                    }
                    and_all(ctx, clauses)?
                }
            })
        }
        ConstraintKind::Between {
            inner,
            first,
            second,
        } => {
            // inner lies within the span of the endpoints on at least one
            // axis: (i - f)(i - s) <= 0
            let yi = y(inner)?;
            let span_y = &(&yi - &y(first)?) * &(&yi - &y(second)?);
            let xi = x(inner)?;
            let span_x = &(&xi - &x(first)?) * &(&xi - &x(second)?);
            let zero = real(ctx, 0.0);
            Some(Bool::or(
                ctx,
                &[&span_y.le(&zero), &span_x.le(&zero)],
            ))
        }
        ConstraintKind::Adjacent { a, b } => {
            let sep_x = real(ctx, half_w(a)? + half_w(b)?);
            let sep_y = real(ctx, half_h(a)? + half_h(b)?);
            let touch_left = (&x(a)? + &sep_x)._eq(&x(b)?);
            let touch_right = (&x(b)? + &sep_x)._eq(&x(a)?);
            let touch_above = (&y(a)? + &sep_y)._eq(&y(b)?);
            let touch_below = (&y(b)? + &sep_y)._eq(&y(a)?);
            Some(Bool::or(
                ctx,
                &[&touch_left, &touch_right, &touch_above, &touch_below],
            ))
        }
        ConstraintKind::Above { a, b, min_gap } => {
            let gap = real(ctx, half_h(a)? + half_h(b)? + min_gap);
            Some((&y(a)? + &gap).le(&y(b)?))
        }
        ConstraintKind::Below { a, b, min_gap } => {
            let gap = real(ctx, half_h(a)? + half_h(b)? + min_gap);
            Some((&y(b)? + &gap).le(&y(a)?))
        }
        ConstraintKind::LeftOf { a, b, min_gap } => {
            let gap = real(ctx, half_w(a)? + half_w(b)? + min_gap);
            Some((&x(a)? + &gap).le(&x(b)?))
        }
        ConstraintKind::RightOf { a, b, min_gap } => {
            let gap = real(ctx, half_w(a)? + half_w(b)? + min_gap);
            Some((&x(b)? + &gap).le(&x(a)?))
        }
        ConstraintKind::StackedVertically { ids } => {
            let mut clauses = Vec::new();
            for pair in ids.windows(2) {
                let offset = real(ctx, half_h(&pair[0])? + half_h(&pair[1])?);
                clauses.push((&y(&pair[0])? + &offset)._eq(&y(&pair[1])?));
            }
            and_all(ctx, clauses)
        }
        ConstraintKind::StackedHorizontally { ids } => {
            let mut clauses = Vec::new();
            for pair in ids.windows(2) {
                let offset = real(ctx, half_w(&pair[0])? + half_w(&pair[1])?);
                clauses.push((&x(&pair[0])? + &offset)._eq(&x(&pair[1])?));
            }
            and_all(ctx, clauses)
        }
        ConstraintKind::Containment { inner, outers } => {
            // inner fully inside at least one outer
            let mut alternatives = Vec::new();
            for outer in outers {
                let dx = real(ctx, half_w(outer)? - half_w(inner)?);
                let dy = real(ctx, half_h(outer)? - half_h(inner)?);
                let inside_x_lo = (&x(outer)? - &dx).le(&x(inner)?);
                let inside_x_hi = x(inner)?.le(&(&x(outer)? + &dx));
                let inside_y_lo = (&y(outer)? - &dy).le(&y(inner)?);
                let inside_y_hi = y(inner)?.le(&(&y(outer)? + &dy));
                alternatives.push(Bool::and(
                    ctx,
                    &[&inside_x_lo, &inside_x_hi, &inside_y_lo, &inside_y_hi],
                ));
            }
            let refs: Vec<&Bool> = alternatives.iter().collect();
            if refs.is_empty() {
                None
            } else {
                Some(Bool::or(ctx, &refs))
            }
        }
    }
}

fn and_all<'ctx>(ctx: &'ctx Context, clauses: Vec<Bool<'ctx>>) -> Option<Bool<'ctx>> {
    if clauses.is_empty() {
        return None;
    }
    let refs: Vec<&Bool> = clauses.iter().collect();
    Some(Bool::and(ctx, &refs))
}
