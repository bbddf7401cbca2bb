use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_flows::Flows;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FlowVersions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FlowVersions::FlowInternalId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FlowVersions::Version).integer().not_null())
                    .col(ColumnDef::new(FlowVersions::Nodes).text().not_null())
                    .col(
                        ColumnDef::new(FlowVersions::DeploymentId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FlowVersions::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(FlowVersions::FlowInternalId)
                            .col(FlowVersions::Version),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_flow_version_flow")
                            .from(FlowVersions::Table, FlowVersions::FlowInternalId)
                            .to(Flows::Table, Flows::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FlowVersions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum FlowVersions {
    Table,
    FlowInternalId,
    Version,
    Nodes,
    DeploymentId,
    CreatedAt,
}
