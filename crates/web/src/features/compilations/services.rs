use sqlx::PgPool;
use storage::{
    dto::{
        common::PaginationParams,
        compilation::{CompilationDto, NewCompilationRequest, UpdateCompilationRequest},
        event::EventShortDto,
    },
    error::Result,
    models::Compilation,
    repository::compilation::CompilationRepository,
};

/// Attach each compilation's events
async fn with_events(
    repo: &CompilationRepository<'_>,
    compilations: Vec<Compilation>,
) -> Result<Vec<CompilationDto>> {
    let ids: Vec<i64> = compilations.iter().map(|c| c.compilation_id).collect();
    let mut events = repo.events_for(&ids).await?;

    Ok(compilations
        .into_iter()
        .map(|compilation| {
            let views = events.remove(&compilation.compilation_id).unwrap_or_default();
            let events = views.into_iter().map(EventShortDto::from).collect();
            CompilationDto::new(compilation, events)
        })
        .collect())
}

async fn load(repo: &CompilationRepository<'_>, compilation: Compilation) -> Result<CompilationDto> {
    let id = compilation.compilation_id;
    let views = repo.events_for(&[id]).await?.remove(&id).unwrap_or_default();
    let events = views.into_iter().map(EventShortDto::from).collect();
    Ok(CompilationDto::new(compilation, events))
}

pub async fn list_compilations(
    pool: &PgPool,
    pinned: Option<bool>,
    page: &PaginationParams,
) -> Result<Vec<CompilationDto>> {
    let repo = CompilationRepository::new(pool);
    let compilations = repo.list(pinned, page).await?;
    with_events(&repo, compilations).await
}

pub async fn get_compilation(pool: &PgPool, compilation_id: i64) -> Result<CompilationDto> {
    let repo = CompilationRepository::new(pool);
    let compilation = repo.find_by_id(compilation_id).await?;
    load(&repo, compilation).await
}

pub async fn create_compilation(
    pool: &PgPool,
    request: &NewCompilationRequest,
) -> Result<CompilationDto> {
    let repo = CompilationRepository::new(pool);
    let compilation = repo.create(request).await?;
    tracing::info!("Created compilation {}", compilation.compilation_id);
    load(&repo, compilation).await
}

pub async fn update_compilation(
    pool: &PgPool,
    compilation_id: i64,
    request: &UpdateCompilationRequest,
) -> Result<CompilationDto> {
    let repo = CompilationRepository::new(pool);
    let compilation = repo.update(compilation_id, request).await?;
    load(&repo, compilation).await
}

pub async fn delete_compilation(pool: &PgPool, compilation_id: i64) -> Result<()> {
    let repo = CompilationRepository::new(pool);
    repo.delete(compilation_id).await
}
