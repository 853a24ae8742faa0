use ir::Operator;

use crate::{Result, RuntimeError, Value};

/// Applies a value operator. Integer arithmetic wraps on overflow.
pub(crate) fn compute(op: Operator, operands: &[Value]) -> Result<Value> {
    let value = match (op, operands) {
        (Operator::Add, [Value::Int(a), Value::Int(b)]) => Value::Int(a.wrapping_add(*b)),
        (Operator::Sub, [Value::Int(a), Value::Int(b)]) => Value::Int(a.wrapping_sub(*b)),
        (Operator::Mul, [Value::Int(a), Value::Int(b)]) => Value::Int(a.wrapping_mul(*b)),
        (Operator::Div, [Value::Int(_), Value::Int(0)]) => return Err(RuntimeError::DivisionByZero),
        (Operator::Div, [Value::Int(a), Value::Int(b)]) => Value::Int(a.wrapping_div(*b)),
        (Operator::Eq, [Value::Int(a), Value::Int(b)]) => Value::Bool(a == b),
        (Operator::Eq, [Value::Bool(a), Value::Bool(b)]) => Value::Bool(a == b),
        (Operator::Lt, [Value::Int(a), Value::Int(b)]) => Value::Bool(a < b),
        (Operator::Gt, [Value::Int(a), Value::Int(b)]) => Value::Bool(a > b),
        (Operator::Le, [Value::Int(a), Value::Int(b)]) => Value::Bool(a <= b),
        (Operator::Ge, [Value::Int(a), Value::Int(b)]) => Value::Bool(a >= b),
        (Operator::And, [Value::Bool(a), Value::Bool(b)]) => Value::Bool(*a && *b),
        (Operator::Or, [Value::Bool(a), Value::Bool(b)]) => Value::Bool(*a || *b),
        (Operator::Not, [Value::Bool(a)]) => Value::Bool(!a),
        _ => {
            let operands: Vec<String> = operands.iter().map(|value| format!("`{}`", value.ty())).collect();
            return Err(RuntimeError::BadOperands {
                op,
                operands: operands.join(", "),
            });
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute() {
        use Value::*;
        assert_eq!(compute(Operator::Add, &[Int(2), Int(3)]).unwrap(), Int(5));
        assert_eq!(compute(Operator::Add, &[Int(i64::MAX), Int(1)]).unwrap(), Int(i64::MIN));
        assert_eq!(compute(Operator::Div, &[Int(-7), Int(2)]).unwrap(), Int(-3));
        assert_eq!(compute(Operator::Eq, &[Bool(true), Bool(true)]).unwrap(), Bool(true));
        assert_eq!(compute(Operator::Not, &[Bool(true)]).unwrap(), Bool(false));
        assert!(matches!(
            compute(Operator::Div, &[Int(1), Int(0)]),
            Err(RuntimeError::DivisionByZero)
        ));
        assert!(matches!(
            compute(Operator::Lt, &[Bool(true), Int(0)]),
            Err(RuntimeError::BadOperands { .. })
        ));
    }
}
