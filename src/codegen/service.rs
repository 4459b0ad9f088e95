use super::model::EntityModel;
use super::{ArtifactGenerator, GeneratedFile, GeneratorConfig, fill};
use crate::schema::Schema;

/// Generic service layer plus one service interface and class per table.
pub struct ServiceGenerator;

impl ArtifactGenerator for ServiceGenerator {
    fn name(&self) -> &'static str {
        "services"
    }

    fn generate(&self, schema: &Schema, config: &GeneratorConfig) -> Vec<GeneratedFile> {
        let mut files = vec![
            GeneratedFile::new("Services/IService.cs", fill(SERVICE_INTERFACE, config)),
            GeneratedFile::new("Services/Service.cs", fill(SERVICE_CLASS, config)),
        ];

        for model in EntityModel::all(schema) {
            files.push(GeneratedFile::new(
                format!("Services/{}.cs", model.service_interface()),
                entity_service(ENTITY_SERVICE_INTERFACE, &model, config),
            ));
            files.push(GeneratedFile::new(
                format!("Services/{}.cs", model.service_class()),
                entity_service(ENTITY_SERVICE_CLASS, &model, config),
            ));
        }

        files
    }
}

const SERVICE_INTERFACE: &str = r#"using System;
using System.Collections.Generic;
using System.Linq;
using System.Linq.Expressions;
using System.Threading.Tasks;

namespace $NAMESPACE.Services
{
    public interface IService<T> where T : class
    {
        IQueryable<T> GetAll();
        IEnumerable<T> Find(Expression<Func<T, bool>> predicate);
        T GetById(object id);
        void Add(T entity);
        void AddRange(IEnumerable<T> entities);
        void Update(T entity);
        void Remove(T entity);
        void RemoveRange(IEnumerable<T> entities);
        void SaveChanges();

        Task<List<T>> GetAllAsync();
        Task<T> GetByIdAsync(object id);
        Task AddAsync(T entity);
        Task AddRangeAsync(IEnumerable<T> entities);
        Task SaveChangesAsync();
    }
}
"#;

const SERVICE_CLASS: &str = r#"using System;
using System.Collections.Generic;
using System.Linq;
using System.Linq.Expressions;
using System.Threading.Tasks;
using $NAMESPACE.Repositories;

namespace $NAMESPACE.Services
{
    public class Service<T> : IService<T> where T : class
    {
        protected readonly IUnitOfWork _unitOfWork;
        protected readonly IRepository<T> _repository;

        public Service(IUnitOfWork unitOfWork, IRepository<T> repository)
        {
            _unitOfWork = unitOfWork;
            _repository = repository;
        }

        public virtual IQueryable<T> GetAll()
        {
            return _repository.GetAll();
        }

        public virtual IEnumerable<T> Find(Expression<Func<T, bool>> predicate)
        {
            return _repository.Find(predicate);
        }

        public virtual T GetById(object id)
        {
            return _repository.GetById(id);
        }

        public virtual void Add(T entity)
        {
            _repository.Add(entity);
        }

        public virtual void AddRange(IEnumerable<T> entities)
        {
            _repository.AddRange(entities);
        }

        public virtual void Update(T entity)
        {
            _repository.Update(entity);
        }

        public virtual void Remove(T entity)
        {
            _repository.Remove(entity);
        }

        public virtual void RemoveRange(IEnumerable<T> entities)
        {
            _repository.RemoveRange(entities);
        }

        public virtual void SaveChanges()
        {
            _unitOfWork.Complete();
        }

        public virtual async Task<List<T>> GetAllAsync()
        {
            return await _repository.GetAllAsync();
        }

        public virtual async Task<T> GetByIdAsync(object id)
        {
            return await _repository.GetByIdAsync(id);
        }

        public virtual async Task AddAsync(T entity)
        {
            await _repository.AddAsync(entity);
        }

        public virtual async Task AddRangeAsync(IEnumerable<T> entities)
        {
            await _repository.AddRangeAsync(entities);
        }

        public virtual async Task SaveChangesAsync()
        {
            await _unitOfWork.CompleteAsync();
        }
    }
}
"#;

const ENTITY_SERVICE_INTERFACE: &str = r#"using $NAMESPACE.Models;

namespace $NAMESPACE.Services
{
    public interface $INTERFACE : IService<$ENTITY>
    {
    }
}
"#;

const ENTITY_SERVICE_CLASS: &str = r#"using $NAMESPACE.Models;
using $NAMESPACE.Repositories;

namespace $NAMESPACE.Services
{
    public class $CLASS : Service<$ENTITY>, $INTERFACE
    {
        public $CLASS(IUnitOfWork unitOfWork)
            : base(unitOfWork, unitOfWork.$REPOSITORY)
        {
        }
    }
}
"#;

fn entity_service(template: &str, model: &EntityModel<'_>, config: &GeneratorConfig) -> String {
    fill(template, config)
        .replace("$INTERFACE", &model.service_interface())
        .replace("$REPOSITORY", &model.repository_property())
        .replace("$CLASS", &model.service_class())
        .replace("$ENTITY", &model.class_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableInfo;
    use std::collections::BTreeMap;

    #[test]
    fn test_entity_services() {
        let mut tables = BTreeMap::new();
        tables.insert("customer_notes".to_string(), TableInfo::default());
        let config = GeneratorConfig {
            namespace: "Crm".to_string(),
            ..GeneratorConfig::default()
        };
        let files = ServiceGenerator.generate(&Schema::from_tables(tables), &config);

        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "Services/IService.cs",
                "Services/Service.cs",
                "Services/ICustomerNotesService.cs",
                "Services/CustomerNotesService.cs",
            ]
        );

        let class = &files[3].content;
        assert!(class.contains(
            "public class CustomerNotesService : Service<CustomerNotes>, ICustomerNotesService"
        ));
        assert!(class.contains("public CustomerNotesService(IUnitOfWork unitOfWork)"));
        assert!(class.contains(": base(unitOfWork, unitOfWork.CustomerNotesRepository)"));
        assert!(files[2].content.contains("public interface ICustomerNotesService : IService<CustomerNotes>"));
        assert!(files.iter().all(|f| !f.content.contains('$')));
        assert!(files.iter().all(|f| f.content.contains("namespace Crm.Services")));
    }

    #[test]
    fn test_generic_service_saves_through_unit_of_work() {
        let files = ServiceGenerator.generate(&Schema::default(), &GeneratorConfig::default());

        assert_eq!(files.len(), 2);
        assert!(files[1].content.contains("_unitOfWork.Complete();"));
        assert!(files[1].content.contains("await _unitOfWork.CompleteAsync();"));
    }
}
