use stemdraw_core::{PrimitiveKind, SceneObject};

/// Escape text content and attribute values for SVG.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn style_attrs(object: &SceneObject) -> String {
    format!(
        "fill='{}' stroke='{}' stroke-width='{}' opacity='{}'",
        escape(&object.style.fill),
        escape(&object.style.stroke),
        object.style.stroke_width,
        object.style.opacity
    )
}

/// Emit one object centered on `(cx, cy)`. Dimensions come from the
/// object's `dimensions` and `properties`, never from its position.
/// Called with `(0, 0)` this produces a reusable, translatable fragment.
pub fn emit(object: &SceneObject, cx: f64, cy: f64, rotation: f64) -> String {
    let w = object.dimensions.width();
    let h = object.dimensions.height();
    let body = match &object.primitive {
        PrimitiveKind::Rect | PrimitiveKind::Block | PrimitiveKind::Other(_) => format!(
            "<rect x='{:.1}' y='{:.1}' width='{:.1}' height='{:.1}' rx='2' {}/>",
            cx - w / 2.0,
            cy - h / 2.0,
            w,
            h,
            style_attrs(object)
        ),
        PrimitiveKind::Circle | PrimitiveKind::Atom => format!(
            "<circle cx='{:.1}' cy='{:.1}' r='{:.1}' {}/>",
            cx,
            cy,
            w / 2.0,
            style_attrs(object)
        ),
        PrimitiveKind::Line | PrimitiveKind::Bond | PrimitiveKind::Wire => format!(
            "<line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}' stroke='{}' stroke-width='{}'/>",
            cx - w / 2.0,
            cy,
            cx + w / 2.0,
            cy,
            escape(&object.style.stroke),
            object.style.stroke_width.max(1.5)
        ),
        PrimitiveKind::Arrow => arrow(object, cx, cy),
        PrimitiveKind::Polygon | PrimitiveKind::Incline => incline(object, cx, cy),
        PrimitiveKind::Text => {
            let text = object.label_text().unwrap_or("");
            format!(
                "<text x='{:.1}' y='{:.1}' font-size='{}' font-family='sans-serif' \
                 text-anchor='middle' dominant-baseline='middle' fill='{}'>{}</text>",
                cx,
                cy,
                object.style.font_size.unwrap_or(14.0),
                escape(&object.style.fill),
                escape(text)
            )
        }
        PrimitiveKind::Battery => battery(object, cx, cy),
        PrimitiveKind::Resistor => resistor(object, cx, cy),
        PrimitiveKind::Capacitor => capacitor(object, cx, cy),
        PrimitiveKind::Switch => switch(object, cx, cy),
        PrimitiveKind::Lens => format!(
            "<ellipse cx='{:.1}' cy='{:.1}' rx='{:.1}' ry='{:.1}' {}/>",
            cx,
            cy,
            w / 2.0,
            h / 2.0,
            style_attrs(object)
        ),
        PrimitiveKind::Spring => spring(object, cx, cy),
    };

    if rotation.abs() > f64::EPSILON {
        format!(
            "<g transform='rotate({:.1} {:.1} {:.1})'>{}</g>",
            rotation, cx, cy, body
        )
    } else {
        body
    }
}

/// Shaft plus head, drawn pointing up; rotation orients it.
fn arrow(object: &SceneObject, cx: f64, cy: f64) -> String {
    let len = object.dimensions.height();
    let head = (len * 0.22).min(18.0);
    let stroke = escape(&object.style.stroke);
    format!(
        "<g><line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}' stroke='{}' stroke-width='2.5'/>\
         <polygon points='{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}' fill='{}'/></g>",
        cx,
        cy + len / 2.0,
        cx,
        cy - len / 2.0 + head,
        stroke,
        cx,
        cy - len / 2.0,
        cx - head / 2.0,
        cy - len / 2.0 + head,
        cx + head / 2.0,
        cy - len / 2.0 + head,
        stroke
    )
}

/// Right triangle: horizontal base, hypotenuse rising left-to-right.
fn incline(object: &SceneObject, cx: f64, cy: f64) -> String {
    let w = object.dimensions.width();
    let h = object.dimensions.height();
    format!(
        "<polygon points='{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}' {}/>",
        cx - w / 2.0,
        cy + h / 2.0,
        cx + w / 2.0,
        cy + h / 2.0,
        cx + w / 2.0,
        cy - h / 2.0,
        style_attrs(object)
    )
}

/// Long/short plate pair with lead stubs.
fn battery(object: &SceneObject, cx: f64, cy: f64) -> String {
    let w = object.dimensions.width();
    let h = object.dimensions.height();
    let stroke = escape(&object.style.stroke);
    let gap = w * 0.18;
    format!(
        "<g stroke='{}' stroke-width='2.5'>\
         <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}'/>\
         <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}'/>\
         <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}'/>\
         <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}'/></g>",
        stroke,
        // left lead
        cx - w / 2.0,
        cy,
        cx - gap / 2.0,
        cy,
        // long plate
        cx - gap / 2.0,
        cy - h / 2.0,
        cx - gap / 2.0,
        cy + h / 2.0,
        // short plate
        cx + gap / 2.0,
        cy - h / 4.0,
        cx + gap / 2.0,
        cy + h / 4.0,
        // right lead
        cx + gap / 2.0,
        cy,
        cx + w / 2.0,
        cy
    )
}

/// Six-segment zigzag between lead stubs.
fn resistor(object: &SceneObject, cx: f64, cy: f64) -> String {
    let w = object.dimensions.width();
    let h = object.dimensions.height();
    let stroke = escape(&object.style.stroke);
    let body_w = w * 0.6;
    let start = cx - body_w / 2.0;
    let step = body_w / 6.0;
    let mut points = vec![format!("{:.1},{:.1}", start, cy)];
    for i in 0..6 {
        let x = start + step * (i as f64 + 0.5);
        let y = if i % 2 == 0 { cy - h / 2.0 } else { cy + h / 2.0 };
        points.push(format!("{:.1},{:.1}", x, y));
    }
    points.push(format!("{:.1},{:.1}", start + body_w, cy));
    format!(
        "<g stroke='{}' stroke-width='2' fill='none'>\
         <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}'/>\
         <polyline points='{}'/>\
         <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}'/></g>",
        stroke,
        cx - w / 2.0,
        cy,
        start,
        cy,
        points.join(" "),
        start + body_w,
        cy,
        cx + w / 2.0,
        cy
    )
}

/// Two parallel bars with leads.
fn capacitor(object: &SceneObject, cx: f64, cy: f64) -> String {
    let w = object.dimensions.width();
    let h = object.dimensions.height();
    let stroke = escape(&object.style.stroke);
    let gap = (w * 0.25).max(8.0);
    format!(
        "<g stroke='{}' stroke-width='2.5'>\
         <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}'/>\
         <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}'/>\
         <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}'/>\
         <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}'/></g>",
        stroke,
        cx - w / 2.0,
        cy,
        cx - gap / 2.0,
        cy,
        cx - gap / 2.0,
        cy - h / 2.0,
        cx - gap / 2.0,
        cy + h / 2.0,
        cx + gap / 2.0,
        cy - h / 2.0,
        cx + gap / 2.0,
        cy + h / 2.0,
        cx + gap / 2.0,
        cy,
        cx + w / 2.0,
        cy
    )
}

/// Open knife switch: two contact dots and a raised lever.
fn switch(object: &SceneObject, cx: f64, cy: f64) -> String {
    let w = object.dimensions.width();
    let stroke = escape(&object.style.stroke);
    let contact = w * 0.3;
    format!(
        "<g stroke='{}' stroke-width='2'>\
         <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}'/>\
         <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}'/>\
         <circle cx='{:.1}' cy='{:.1}' r='3' fill='{}'/>\
         <circle cx='{:.1}' cy='{:.1}' r='3' fill='{}'/>\
         <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}'/></g>",
        stroke,
        cx - w / 2.0,
        cy,
        cx - contact,
        cy,
        cx + contact,
        cy,
        cx + w / 2.0,
        cy,
        cx - contact,
        cy,
        stroke,
        cx + contact,
        cy,
        stroke,
        cx - contact,
        cy,
        cx + contact * 0.8,
        cy - w * 0.22,
    )
}

/// Vertical coil zigzag.
fn spring(object: &SceneObject, cx: f64, cy: f64) -> String {
    let w = object.dimensions.width();
    let h = object.dimensions.height();
    let stroke = escape(&object.style.stroke);
    let coils = 6;
    let step = h * 0.7 / coils as f64;
    let top = cy - h * 0.35;
    let mut points = vec![format!("{:.1},{:.1}", cx, cy - h / 2.0)];
    points.push(format!("{:.1},{:.1}", cx, top));
    for i in 0..coils {
        let x = if i % 2 == 0 { cx - w / 2.0 } else { cx + w / 2.0 };
        points.push(format!("{:.1},{:.1}", x, top + step * (i as f64 + 0.5)));
    }
    points.push(format!("{:.1},{:.1}", cx, cy + h * 0.35));
    points.push(format!("{:.1},{:.1}", cx, cy + h / 2.0));
    format!(
        "<polyline points='{}' fill='none' stroke='{}' stroke-width='2'/>",
        points.join(" "),
        stroke
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemdraw_core::{AttrValue, Dimensions};

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
    }

    #[test]
    fn text_objects_emit_escaped_content() {
        let mut label = SceneObject::new("l", PrimitiveKind::Text, Dimensions::rect(40.0, 18.0));
        label
            .properties
            .insert("text".to_string(), AttrValue::Str("C1 < 2µF".to_string()));
        let svg = emit(&label, 100.0, 50.0, 0.0);
        assert!(svg.contains("C1 &lt; 2µF"));
        assert!(!svg.contains("C1 < 2µF"));
    }

    #[test]
    fn rotation_wraps_in_transform_group() {
        let block = SceneObject::new("b", PrimitiveKind::Rect, Dimensions::rect(40.0, 40.0));
        let svg = emit(&block, 10.0, 20.0, 45.0);
        assert!(svg.starts_with("<g transform='rotate(45.0 10.0 20.0)'>"));
    }

    #[test]
    fn fragment_at_origin_is_position_free() {
        let battery = SceneObject::new("bat", PrimitiveKind::Battery, Dimensions::rect(64.0, 40.0));
        let fragment = emit(&battery, 0.0, 0.0, 0.0);
        assert!(fragment.contains("<line"));
    }
}
