//! DB-backed tests for the booking invariants that live in the storage
//! layer: the composite (session, row, seat) uniqueness constraint and
//! cascade deletion from reservations to tickets.
//!
//! These need a running PostgreSQL; point DATABASE_URL at a scratch
//! database and run `cargo test -- --ignored`.

use planetarium_api::error::AppError;
use planetarium_api::models::{PlanetariumDome, Ticket};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

async fn connect() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for DB tests");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("failed to connect to postgres");

    sqlx::migrate!("./src/migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    pool
}

struct Fixture {
    session_id: i64,
    reservation_id: i64,
    user_id: i64,
    dome: PlanetariumDome,
}

async fn seed(pool: &PgPool, rows: i32, seats_in_row: i32) -> Fixture {
    let email = format!("test-{}@test.com", uuid::Uuid::new_v4());
    let user_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (email, password_hash) VALUES ($1, 'x') RETURNING user_id",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .expect("failed to insert user");

    let show_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO astronomy_shows (title, description)
         VALUES ('Sample show', 'Sample description')
         RETURNING id",
    )
    .fetch_one(pool)
    .await
    .expect("failed to insert show");

    let dome = sqlx::query_as::<_, PlanetariumDome>(
        r#"
        INSERT INTO planetarium_domes (name, "rows", seats_in_row)
        VALUES ('Blue', $1, $2)
        RETURNING id, name, "rows", seats_in_row
        "#,
    )
    .bind(rows)
    .bind(seats_in_row)
    .fetch_one(pool)
    .await
    .expect("failed to insert dome");

    let session_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO show_sessions (show_time, show_id, dome_id)
         VALUES (NOW() + INTERVAL '1 day', $1, $2)
         RETURNING id",
    )
    .bind(show_id)
    .bind(dome.id)
    .fetch_one(pool)
    .await
    .expect("failed to insert session");

    let reservation_id =
        sqlx::query_scalar::<_, i64>("INSERT INTO reservations (user_id) VALUES ($1) RETURNING id")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .expect("failed to insert reservation");

    Fixture {
        session_id,
        reservation_id,
        user_id,
        dome,
    }
}

async fn ticket_count(pool: &PgPool, reservation_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tickets WHERE reservation_id = $1")
        .bind(reservation_id)
        .fetch_one(pool)
        .await
        .expect("failed to count tickets")
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn second_commit_for_the_same_seat_conflicts() {
    let pool = connect().await;
    let f = seed(&pool, 10, 10).await;

    Ticket::create(&pool, f.session_id, f.reservation_id, 5, 5, &f.dome)
        .await
        .expect("first commit should win the seat");

    let err = Ticket::create(&pool, f.session_id, f.reservation_id, 5, 5, &f.dome)
        .await
        .expect_err("second commit must be rejected");
    match err {
        AppError::SeatTaken { row, seat } => {
            assert_eq!((row, seat), (5, 5));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(ticket_count(&pool, f.reservation_id).await, 1);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn racing_commits_resolve_to_one_winner() {
    let pool = connect().await;
    let f = seed(&pool, 10, 10).await;

    let other_reservation =
        sqlx::query_scalar::<_, i64>("INSERT INTO reservations (user_id) VALUES ($1) RETURNING id")
            .bind(f.user_id)
            .fetch_one(&pool)
            .await
            .expect("failed to insert second reservation");

    let (a, b) = tokio::join!(
        Ticket::create(&pool, f.session_id, f.reservation_id, 3, 7, &f.dome),
        Ticket::create(&pool, f.session_id, other_reservation, 3, 7, &f.dome),
    );

    let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one of the racing commits may win");
    for r in [a, b] {
        if let Err(err) = r {
            assert!(matches!(err, AppError::SeatTaken { row: 3, seat: 7 }));
        }
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn out_of_range_seat_never_reaches_storage() {
    let pool = connect().await;
    let f = seed(&pool, 20, 20).await;

    let err = Ticket::create(&pool, f.session_id, f.reservation_id, 21, 5, &f.dome)
        .await
        .expect_err("row 21 of 20 must be rejected");
    assert!(matches!(err, AppError::SeatOutOfRange { field: "row", .. }));

    assert_eq!(ticket_count(&pool, f.reservation_id).await, 0);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn deleting_a_reservation_cascades_to_its_tickets() {
    let pool = connect().await;
    let f = seed(&pool, 10, 10).await;

    for seat in 1..=3 {
        Ticket::create(&pool, f.session_id, f.reservation_id, 1, seat, &f.dome)
            .await
            .expect("seed ticket");
    }
    assert_eq!(ticket_count(&pool, f.reservation_id).await, 3);

    sqlx::query("DELETE FROM reservations WHERE id = $1")
        .bind(f.reservation_id)
        .execute(&pool)
        .await
        .expect("failed to delete reservation");

    assert_eq!(ticket_count(&pool, f.reservation_id).await, 0);
}
