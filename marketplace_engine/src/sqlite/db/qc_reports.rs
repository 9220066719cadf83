use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{NewQcReport, QcReport, QcStatus};

/// Records a QC inspection report. The verdict is supplied by the caller, which derives it from the score and the
/// configured pass threshold. Evidence arrays are stored as JSON text.
pub async fn insert_report(
    report: NewQcReport,
    status: QcStatus,
    conn: &mut SqliteConnection,
) -> Result<QcReport, sqlx::Error> {
    let report = sqlx::query_as(
        r#"
            INSERT INTO qc_reports (
                order_id,
                photos,
                videos,
                notes,
                score,
                status
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(report.order_id)
    .bind(Json(report.photos))
    .bind(Json(report.videos))
    .bind(report.notes)
    .bind(report.score)
    .bind(status.to_string())
    .fetch_one(conn)
    .await?;
    Ok(report)
}

/// All QC reports for an order, newest first.
pub async fn reports_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<QcReport>, sqlx::Error> {
    let reports = sqlx::query_as("SELECT * FROM qc_reports WHERE order_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(reports)
}
