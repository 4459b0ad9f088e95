use super::{ArtifactGenerator, GeneratedFile, GeneratorConfig, fill};
use crate::schema::Schema;

/// Registration snippet and migration commands; independent of the tables.
pub struct SupportGenerator;

impl ArtifactGenerator for SupportGenerator {
    fn name(&self) -> &'static str {
        "support"
    }

    fn generate(&self, _schema: &Schema, config: &GeneratorConfig) -> Vec<GeneratedFile> {
        vec![
            GeneratedFile::new("Startup_EF_Config.cs", fill(STARTUP, config)),
            GeneratedFile::new("EF_Migrations_Commands.txt", fill(MIGRATIONS, config)),
        ]
    }
}

const STARTUP: &str = r#"// Add these registrations to Startup.cs or Program.cs.

using Microsoft.EntityFrameworkCore;
using $NAMESPACE.Data;
using $NAMESPACE.Repositories;

services.AddDbContext<$CONTEXT>(options =>
    options.UseSqlServer(Configuration.GetConnectionString("DefaultConnection")));

services.AddScoped<IUnitOfWork, UnitOfWork>();
services.AddScoped(typeof(IRepository<>), typeof(Repository<>));

// appsettings.json
/*
{
  "ConnectionStrings": {
    "DefaultConnection": "Server=yourserver;Database=yourdatabase;Trusted_Connection=True;MultipleActiveResultSets=true"
  }
}
*/
"#;

const MIGRATIONS: &str = r#"# Entity Framework Core migrations for $CONTEXT

# Install the required packages
dotnet add package Microsoft.EntityFrameworkCore.SqlServer
dotnet add package Microsoft.EntityFrameworkCore.Tools

# Create the initial migration
dotnet ef migrations add InitialCreate --context $CONTEXT

# Apply migrations to the database
dotnet ef database update --context $CONTEXT
"#;
