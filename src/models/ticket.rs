use serde::Serialize;
use sqlx::FromRow;

use crate::error::AppError;
use crate::models::PlanetariumDome;

/// A single seat claim within a session. Created atomically as part of a
/// reservation, validated at creation time, never mutated afterwards;
/// removed only by cascade from its reservation or session.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ticket {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    pub session_id: i64,
    pub reservation_id: i64,
}

/// Checks a requested seat against the dome's physical grid.
///
/// Both coordinates are 1-indexed. Each axis is checked against its own
/// bound, row first, and the first violation wins; the error is scoped to
/// the failing axis so callers can surface a field-level message with the
/// valid inclusive range.
pub fn validate_seat(row: i32, seat: i32, dome: &PlanetariumDome) -> Result<(), AppError> {
    for (value, field, bound_name, bound) in [
        (row, "row", "rows", dome.rows),
        (seat, "seat", "seats_in_row", dome.seats_in_row),
    ] {
        if !(1..=bound).contains(&value) {
            return Err(AppError::SeatOutOfRange {
                field,
                bound_name,
                bound,
            });
        }
    }

    Ok(())
}

impl Ticket {
    /// Validates the seat against the dome and inserts the ticket.
    ///
    /// Uniqueness of (session, row, seat) is deliberately left to the
    /// database constraint rather than a pre-check: two racing
    /// reservations for the same seat resolve to exactly one winner at
    /// commit, and the loser gets [`AppError::SeatTaken`].
    pub async fn create(
        conn: impl sqlx::PgExecutor<'_>,
        session_id: i64,
        reservation_id: i64,
        row: i32,
        seat: i32,
        dome: &PlanetariumDome,
    ) -> Result<i64, AppError> {
        validate_seat(row, seat, dome)?;

        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO tickets (session_id, reservation_id, "row", seat)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(session_id)
        .bind(reservation_id)
        .bind(row)
        .bind(seat)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::from_ticket_insert(e, row, seat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dome(rows: i32, seats_in_row: i32) -> PlanetariumDome {
        PlanetariumDome {
            id: 1,
            name: "Blue".to_string(),
            rows,
            seats_in_row,
        }
    }

    #[test]
    fn row_past_the_last_one_is_rejected() {
        let err = validate_seat(21, 5, &dome(20, 20)).unwrap_err();
        match err {
            AppError::SeatOutOfRange { field, bound, .. } => {
                assert_eq!(field, "row");
                assert_eq!(bound, 20);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            validate_seat(21, 5, &dome(20, 20)).unwrap_err().to_string(),
            "row number must be in available range: (1, rows): (1, 20)"
        );
    }

    #[test]
    fn seat_past_the_last_one_is_rejected() {
        let err = validate_seat(5, 21, &dome(20, 20)).unwrap_err();
        match err {
            AppError::SeatOutOfRange { field, bound, .. } => {
                assert_eq!(field, "seat");
                assert_eq!(bound, 20);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bounds_are_inclusive_on_both_axes() {
        let d = dome(5, 5);
        assert!(validate_seat(1, 1, &d).is_ok());
        assert!(validate_seat(5, 5, &d).is_ok());
        assert!(validate_seat(1, 5, &d).is_ok());
        assert!(validate_seat(5, 1, &d).is_ok());

        assert!(validate_seat(0, 1, &d).is_err());
        assert!(validate_seat(6, 1, &d).is_err());
        assert!(validate_seat(1, 0, &d).is_err());
        assert!(validate_seat(1, 6, &d).is_err());
    }

    #[test]
    fn negative_coordinates_are_rejected() {
        let d = dome(10, 10);
        assert!(validate_seat(-1, 5, &d).is_err());
        assert!(validate_seat(5, -1, &d).is_err());
    }

    #[test]
    fn row_is_checked_before_seat() {
        // Both axes out of range: the row error wins.
        let err = validate_seat(0, 0, &dome(10, 10)).unwrap_err();
        match err {
            AppError::SeatOutOfRange { field, .. } => assert_eq!(field, "row"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn validation_is_idempotent() {
        let d = dome(10, 10);
        for _ in 0..3 {
            assert!(validate_seat(5, 5, &d).is_ok());
            assert!(validate_seat(11, 5, &d).is_err());
        }
    }

    proptest! {
        // validate_seat succeeds iff both coordinates are inside the grid.
        #[test]
        fn accepts_exactly_the_seats_inside_the_grid(
            rows in 1i32..=50,
            seats_in_row in 1i32..=50,
            row in -5i32..=55,
            seat in -5i32..=55,
        ) {
            let d = dome(rows, seats_in_row);
            let in_bounds = (1..=rows).contains(&row) && (1..=seats_in_row).contains(&seat);
            prop_assert_eq!(validate_seat(row, seat, &d).is_ok(), in_bounds);
        }
    }
}
