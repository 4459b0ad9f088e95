use super::model::EntityModel;
use super::{ArtifactGenerator, GeneratedFile, GeneratorConfig, SourceWriter, fill};
use crate::schema::Schema;

/// Generic repository plus a unit of work exposing one repository per table.
pub struct RepositoryGenerator;

impl ArtifactGenerator for RepositoryGenerator {
    fn name(&self) -> &'static str {
        "repositories"
    }

    fn generate(&self, schema: &Schema, config: &GeneratorConfig) -> Vec<GeneratedFile> {
        let models = EntityModel::all(schema);
        vec![
            GeneratedFile::new("Repositories/IRepository.cs", fill(REPOSITORY_INTERFACE, config)),
            GeneratedFile::new("Repositories/Repository.cs", fill(REPOSITORY_CLASS, config)),
            GeneratedFile::new("Repositories/IUnitOfWork.cs", unit_of_work_interface(&models, config)),
            GeneratedFile::new("Repositories/UnitOfWork.cs", unit_of_work_class(&models, config)),
        ]
    }
}

const REPOSITORY_INTERFACE: &str = r#"using System;
using System.Collections.Generic;
using System.Linq;
using System.Linq.Expressions;
using System.Threading.Tasks;

namespace $NAMESPACE.Repositories
{
    public interface IRepository<T> where T : class
    {
        IQueryable<T> GetAll();
        IQueryable<T> Find(Expression<Func<T, bool>> predicate);
        T GetById(object id);
        void Add(T entity);
        void AddRange(IEnumerable<T> entities);
        void Update(T entity);
        void Remove(T entity);
        void RemoveRange(IEnumerable<T> entities);

        Task<List<T>> GetAllAsync();
        Task<T> GetByIdAsync(object id);
        Task AddAsync(T entity);
        Task AddRangeAsync(IEnumerable<T> entities);
    }
}
"#;

const REPOSITORY_CLASS: &str = r#"using Microsoft.EntityFrameworkCore;
using System;
using System.Collections.Generic;
using System.Linq;
using System.Linq.Expressions;
using System.Threading.Tasks;
using $NAMESPACE.Data;

namespace $NAMESPACE.Repositories
{
    public class Repository<T> : IRepository<T> where T : class
    {
        protected readonly $CONTEXT _context;
        protected readonly DbSet<T> _dbSet;

        public Repository($CONTEXT context)
        {
            _context = context;
            _dbSet = context.Set<T>();
        }

        public virtual IQueryable<T> GetAll()
        {
            return _dbSet;
        }

        public virtual IQueryable<T> Find(Expression<Func<T, bool>> predicate)
        {
            return _dbSet.Where(predicate);
        }

        public virtual T GetById(object id)
        {
            return _dbSet.Find(id);
        }

        public virtual void Add(T entity)
        {
            _dbSet.Add(entity);
        }

        public virtual void AddRange(IEnumerable<T> entities)
        {
            _dbSet.AddRange(entities);
        }

        public virtual void Update(T entity)
        {
            _dbSet.Attach(entity);
            _context.Entry(entity).State = EntityState.Modified;
        }

        public virtual void Remove(T entity)
        {
            if (_context.Entry(entity).State == EntityState.Detached)
            {
                _dbSet.Attach(entity);
            }
            _dbSet.Remove(entity);
        }

        public virtual void RemoveRange(IEnumerable<T> entities)
        {
            _dbSet.RemoveRange(entities);
        }

        public virtual async Task<List<T>> GetAllAsync()
        {
            return await _dbSet.ToListAsync();
        }

        public virtual async Task<T> GetByIdAsync(object id)
        {
            return await _dbSet.FindAsync(id);
        }

        public virtual async Task AddAsync(T entity)
        {
            await _dbSet.AddAsync(entity);
        }

        public virtual async Task AddRangeAsync(IEnumerable<T> entities)
        {
            await _dbSet.AddRangeAsync(entities);
        }
    }
}
"#;

const UNIT_OF_WORK_TAIL: &str = r#"        public int Complete()
        {
            return _context.SaveChanges();
        }

        public async Task<int> CompleteAsync()
        {
            return await _context.SaveChangesAsync();
        }

        protected virtual void Dispose(bool disposing)
        {
            if (!_disposed && disposing)
            {
                _context.Dispose();
            }
            _disposed = true;
        }

        public void Dispose()
        {
            Dispose(true);
            GC.SuppressFinalize(this);
        }
    }
}
"#;

fn entity_usings<'a>(models: &[EntityModel<'_>], base: &[&'a str], entities: &'a str) -> Vec<&'a str> {
    let mut usings = base.to_vec();
    if !models.is_empty() {
        usings.push(entities);
    }
    usings
}

fn unit_of_work_interface(models: &[EntityModel<'_>], config: &GeneratorConfig) -> String {
    let entities = format!("{}.Models", config.namespace);
    let mut w = SourceWriter::default();
    w.usings(&entity_usings(models, &["System", "System.Threading.Tasks"], &entities));
    w.open(0, &format!("namespace {}.Repositories", config.namespace));
    w.open(1, "public interface IUnitOfWork : IDisposable");

    for model in models {
        w.line(
            2,
            &format!(
                "IRepository<{}> {} {{ get; }}",
                model.class_name,
                model.repository_property()
            ),
        );
    }
    if !models.is_empty() {
        w.blank();
    }

    w.line(2, "int Complete();");
    w.line(2, "Task<int> CompleteAsync();");
    w.close(1).close(0);
    w.finish()
}

fn unit_of_work_class(models: &[EntityModel<'_>], config: &GeneratorConfig) -> String {
    let data = format!("{}.Data", config.namespace);
    let entities = format!("{}.Models", config.namespace);
    let ctx = &config.context_name;

    let mut w = SourceWriter::default();
    w.usings(&entity_usings(
        models,
        &["System", "System.Threading.Tasks", &data],
        &entities,
    ));
    w.open(0, &format!("namespace {}.Repositories", config.namespace));
    w.open(1, "public class UnitOfWork : IUnitOfWork");
    w.line(2, &format!("private readonly {} _context;", ctx));
    w.line(2, "private bool _disposed;");
    for model in models {
        w.line(
            2,
            &format!(
                "private IRepository<{}> {};",
                model.class_name,
                model.repository_field()
            ),
        );
    }
    w.blank();

    w.open(2, &format!("public UnitOfWork({} context)", ctx));
    w.line(3, "_context = context;");
    w.close(2).blank();

    // Repositories are created on first access.
    for model in models {
        let field = model.repository_field();
        w.open(
            2,
            &format!(
                "public IRepository<{}> {}",
                model.class_name,
                model.repository_property()
            ),
        );
        w.open(3, "get");
        w.open(4, &format!("if ({} == null)", field));
        w.line(5, &format!("{} = new Repository<{}>(_context);", field, model.class_name));
        w.close(4);
        w.line(4, &format!("return {};", field));
        w.close(3);
        w.close(2).blank();
    }

    let mut out = w.finish();
    out.push_str(UNIT_OF_WORK_TAIL);
    out
}
