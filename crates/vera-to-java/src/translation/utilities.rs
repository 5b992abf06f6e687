// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use crate::context::TranslationContext;
use crate::error::{Result, TranslationError};
use crate::expression_converter::{self as conv, bit_constant};
use java_schema::runtime::{JUNO, UNDEFINED};
use java_schema::{Expr, JavaType};
use vera_model::{Loc, VeraType};

/// Convert `value` to `to` for a use at `site`. Class and array types follow Java
/// assignability; enums use the configured checking policy; everything else goes
/// through the representation converter.
pub fn convert_to(
    ctx: &TranslationContext<'_, '_>,
    value: Expr,
    to: &JavaType,
    signed: bool,
    site: &str,
    loc: Loc,
) -> Result<Expr> {
    let same_width = match (&value.ty, to) {
        (JavaType::BitVector(from), JavaType::BitVector(Some(w))) => *from == Some(*w),
        _ => true,
    };
    if &value.ty == to && same_width {
        return Ok(value);
    }
    match to {
        JavaType::Class(_) | JavaType::Array(_) | JavaType::AssocArray { .. } | JavaType::Event => {
            if ctx.session.schema.is_assignable_from(to, &value.ty) {
                return Ok(match value.ty {
                    JavaType::Null => Expr::null(to.clone()),
                    _ => value,
                });
            }
            Err(TranslationError::conversion(&value.ty, to, site, loc))
        }
        JavaType::Enum(name) => conv::to_enum(value, name, ctx.session.options.checked_enum_conversion)
            .map_err(|e| e.at(site, loc)),
        _ => conv::convert(value, to, signed).map_err(|e| e.at(site, loc)),
    }
}

/// Value of a variable that was declared without an initializer
pub fn default_value(ty: &JavaType) -> Expr {
    match ty {
        JavaType::Boolean => Expr::bool(false),
        JavaType::Char => Expr::char('\0'),
        JavaType::Int => Expr::int(0),
        JavaType::Long => Expr::long(0),
        JavaType::Bit => bit_constant("X"),
        JavaType::BitVector(Some(w)) => {
            Expr::static_call(java_schema::runtime::BIT_VECTOR, "allX", vec![Expr::int(*w as i32)], ty.clone())
        }
        JavaType::JunoString => Expr::new_object(JavaType::JunoString, vec![Expr::string("")]),
        JavaType::Enum(name) => Expr::static_field(name, UNDEFINED, ty.clone()),
        JavaType::Event => Expr::new_object(JavaType::Event, vec![]),
        JavaType::AssocArray { .. } => Expr::new_object(ty.clone(), vec![]),
        other => Expr::null(other.clone()),
    }
}

/// Whether array elements of `ty` need an explicit fill after allocation. Mutable
/// element types are left `null` since a fill would share one instance.
pub fn needs_fill(element: &JavaType) -> bool {
    !element.has_mutable_reference_semantics() && default_value(element).as_literal().is_none()
}

/// `Juno.fill(array, value)`, which fills every dimension and returns the array
pub fn fill_array(array: Expr, value: Expr) -> Expr {
    let ty = array.ty.clone();
    Expr::static_call(JUNO, "fill", vec![array, value], ty)
}

/// Innermost element type of a possibly nested array type
pub fn innermost_element(ty: &JavaType) -> &JavaType {
    match ty {
        JavaType::Array(element) => innermost_element(element),
        other => other,
    }
}

/// Value a declaration without initializer starts with. Fixed-size arrays are
/// allocated with every element at its default.
pub fn initial_value(source: &VeraType, ty: &JavaType) -> Expr {
    match source {
        VeraType::FixedArray { dims, .. } => {
            let sizes = dims.iter().map(|d| Expr::int(*d as i32)).collect();
            let array = Expr::new_multi_array(ty.clone(), sizes);
            let element = innermost_element(ty);
            if needs_fill(element) {
                fill_array(array, default_value(element))
            } else {
                array
            }
        }
        _ => default_value(ty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use java_schema::render_expr_to_string;

    #[test]
    fn test_default_values() {
        assert_snapshot!(render_expr_to_string(&default_value(&JavaType::bit_vector(8))), @"BitVector.allX(8)");
        assert_snapshot!(render_expr_to_string(&default_value(&JavaType::Bit)), @"Bit.X");
        assert_snapshot!(render_expr_to_string(&default_value(&JavaType::Enum("Color".into()))), @"Color.UNDEFINED");
        assert_snapshot!(render_expr_to_string(&default_value(&JavaType::Integer)), @"null");
        assert!(!needs_fill(&JavaType::Int));
        assert!(!needs_fill(&JavaType::Integer));
        assert!(needs_fill(&JavaType::bit_vector(4)));
        assert!(needs_fill(&JavaType::Bit));
    }
}
